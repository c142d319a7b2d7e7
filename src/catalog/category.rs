//! Category path normalization
//!
//! Hierarchical category strings from question banks ("$course$/top/Bio/Cells")
//! share a long common prefix. Only the distinguishing tail is a useful topic name.

/// Separator between category levels
const SEPARATOR: char = '/';

/// Remove the longest common leading path segments shared by every path.
///
/// A path that would become empty keeps its last segment.
pub fn strip_common_prefix(paths: &[String]) -> Vec<String> {
    let split: Vec<Vec<&str>> = paths.iter().map(|p| p.split(SEPARATOR).collect()).collect();

    let Some(first) = split.first() else {
        return Vec::new();
    };

    let mut common = first.len();
    for segments in &split[1..] {
        common = common.min(first.iter().zip(segments).take_while(|(a, b)| a == b).count());
    }

    split
        .iter()
        .map(|segments| {
            let keep = common.min(segments.len().saturating_sub(1));
            segments[keep..].join("/")
        })
        .collect()
}
