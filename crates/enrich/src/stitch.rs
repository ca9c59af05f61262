//! Narrative assembly for video captions.

/// Collapse consecutive-or-not duplicate captions, case-insensitively,
/// keeping the first spelling seen.
fn collapse(captions: &[String]) -> Vec<&str> {
    let mut seen: Vec<String> = Vec::new();
    let mut unique: Vec<&str> = Vec::new();
    for caption in captions {
        let trimmed = caption.trim();
        if trimmed.is_empty() {
            continue;
        }
        let folded = trimmed.to_lowercase();
        if !seen.contains(&folded) {
            seen.push(folded);
            unique.push(trimmed);
        }
    }
    unique
}

/// Stitch per-frame captions into one video description.
///
/// Duplicates are collapsed first, then the phrasing depends on how many
/// distinct scenes remain: a single scene is stated plainly, two scenes in
/// sequence, three as beginning/middle/end, and longer videos list the
/// middle scenes between beginning and end.
pub fn stitch(frame_captions: &[String]) -> String {
    let scenes = collapse(frame_captions);
    match scenes.as_slice() {
        [] => "Video content".to_string(),
        [only] => format!("Video showing {only}"),
        [first, second] => format!("Video showing {first}, then {second}"),
        [first, middle, last] => {
            format!("Video beginning with {first}, showing {middle}, and ending with {last}")
        },
        [first, middle @ .., last] => {
            format!(
                "Video beginning with {first}, showing {}, and ending with {last}",
                middle.join(", ")
            )
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn caps(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_duplicates_collapse_before_phrasing() {
        let captions = caps(&["a dog running", "a dog running", "a dog jumping"]);
        assert_eq!(stitch(&captions), "Video showing a dog running, then a dog jumping");
    }

    #[rstest]
    #[case(&[], "Video content")]
    #[case(&["a sunset"], "Video showing a sunset")]
    #[case(&["a sunset", "a campfire"], "Video showing a sunset, then a campfire")]
    #[case(
        &["a sunset", "a campfire", "stars"],
        "Video beginning with a sunset, showing a campfire, and ending with stars"
    )]
    #[case(
        &["a sunset", "a campfire", "people dancing", "stars"],
        "Video beginning with a sunset, showing a campfire, people dancing, and ending with stars"
    )]
    fn test_branches(#[case] captions: &[&str], #[case] expected: &str) {
        assert_eq!(stitch(&caps(captions)), expected);
    }

    #[test]
    fn test_collapse_is_case_insensitive() {
        let captions = caps(&["A Dog Running", "a dog running"]);
        assert_eq!(stitch(&captions), "Video showing A Dog Running");
    }

    #[test]
    fn test_blank_captions_ignored() {
        let captions = caps(&["", "  ", "a beach"]);
        assert_eq!(stitch(&captions), "Video showing a beach");
    }
}
