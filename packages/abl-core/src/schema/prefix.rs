//! Abbreviation matching over name-sorted candidate lists.

/// Finds the candidate abbreviated by `name`, requiring the match to be unique.
///
/// `candidates` must be sorted by the lowercase name returned by `key`.
/// The first candidate not less than the target must start with it, and if
/// the target is shorter than that candidate, the following candidate must
/// not also start with it.
///
/// # Arguments
/// * `candidates` - Candidates sorted by lowercase name
/// * `name` - Full name or abbreviation, any case
/// * `key` - Returns the lowercase name of a candidate
///
/// # Returns
/// The matching candidate, or `None` if nothing matches or the abbreviation
/// is ambiguous.
pub(crate) fn lookup_unique_prefix<'a, T, F>(candidates: &'a [T], name: &str, key: F) -> Option<&'a T>
where
    F: Fn(&'a T) -> &'a str,
{
    let target = name.to_lowercase();
    let start = ceiling(candidates, &target, &key);
    let found = candidates.get(start)?;
    let found_name = key(found);
    if !found_name.starts_with(&target) {
        return None;
    }
    if target.len() < found_name.len() {
        if let Some(next) = candidates.get(start + 1) {
            if key(next).starts_with(&target) {
                return None;
            }
        }
    }
    Some(found)
}

/// Finds the first candidate abbreviated by `name` without checking uniqueness.
pub(crate) fn lookup_prefix<'a, T, F>(candidates: &'a [T], name: &str, key: F) -> Option<&'a T>
where
    F: Fn(&'a T) -> &'a str,
{
    let target = name.to_lowercase();
    let start = ceiling(candidates, &target, &key);
    candidates
        .get(start)
        .filter(|found| key(*found).starts_with(&target))
}

/// Position of the first candidate whose key is not less than `target`.
fn ceiling<'a, T, F>(candidates: &'a [T], target: &str, key: &F) -> usize
where
    F: Fn(&'a T) -> &'a str,
{
    let (mut lo, mut hi) = (0, candidates.len());
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if key(&candidates[mid]) < target {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    lo
}
