//! "Did you mean?" suggestions for unknown identifiers, methods and members.
//!
//! A candidate is suggested when it is within an edit-distance threshold
//! scaled to the input length, or failing that, when one name is a prefix
//! of the other. Candidates usually come out of hash maps, so ties are
//! broken alphabetically to keep messages deterministic.

/// Levenshtein edit distance between two strings.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a.chars().count();
    }

    let mut prev_row: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr_row: Vec<usize> = vec![0; b_chars.len() + 1];

    for (i, a_char) in a.chars().enumerate() {
        curr_row[0] = i + 1;
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = usize::from(a_char != *b_char);
            curr_row[j + 1] = (prev_row[j + 1] + 1)
                .min(curr_row[j] + 1)
                .min(prev_row[j] + cost);
        }
        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[b_chars.len()]
}

/// Maximum edit distance worth suggesting for a name of this length.
fn default_threshold(name_len: usize) -> usize {
    match name_len {
        0 => 0,
        1..=2 => 1,
        3..=5 => 2,
        6..=10 => 3,
        n => (n / 2).min(5),
    }
}

/// Pick the best suggestion for `name` among `candidates`.
///
/// The exact name itself is never suggested.
pub fn suggest_similar<'a>(
    name: &str,
    candidates: impl Iterator<Item = &'a str>,
) -> Option<&'a str> {
    if name.is_empty() {
        return None;
    }
    let threshold = default_threshold(name.chars().count());

    let mut best_edit: Option<(&str, usize)> = None;
    let mut best_prefix: Option<&str> = None;

    for candidate in candidates {
        if candidate == name || candidate.is_empty() {
            continue;
        }

        if name.len().abs_diff(candidate.len()) <= threshold {
            let distance = edit_distance(name, candidate);
            if distance <= threshold {
                let better = match best_edit {
                    None => true,
                    Some((best, best_dist)) => {
                        distance < best_dist || (distance == best_dist && candidate < best)
                    }
                };
                if better {
                    best_edit = Some((candidate, distance));
                }
            }
        }

        let is_prefix = name.len() >= 2
            && (candidate.starts_with(name) || name.starts_with(candidate));
        if is_prefix && best_prefix.map_or(true, |best| candidate < best) {
            best_prefix = Some(candidate);
        }
    }

    best_edit.map(|(s, _)| s).or(best_prefix)
}
