use std::io::{self, Write};

use anyhow::{Result, bail};
use tracing::info;

use crate::cli::MatchArgs;
use crate::util::read_name_list;

pub fn run(args: MatchArgs) -> Result<()> {
    let mut candidates = args.candidates.clone();
    if let Some(path) = &args.candidates_file {
        candidates.extend(read_name_list(path)?);
    }

    if candidates.is_empty() {
        bail!("no candidates given; use --candidate or --candidates-file");
    }

    let matched = find_matching_name(&args.name, &candidates);
    info!(
        name = %args.name,
        candidates = candidates.len(),
        matched = matched.is_some(),
        "name match evaluated"
    );

    let mut output = io::BufWriter::new(io::stdout().lock());
    if let Some(candidate) = matched {
        writeln!(output, "{candidate}")?;
    }
    output.flush()?;
    Ok(())
}

/// Returns the first candidate that occurs verbatim inside `target`.
///
/// Candidates are tried in iteration order, so a shorter name listed before a
/// longer one that contains it wins.
pub fn find_matching_name<'a, I, S>(target: &str, candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a S>,
    S: AsRef<str> + ?Sized + 'a,
{
    candidates
        .into_iter()
        .map(|candidate| -> &'a str { candidate.as_ref() })
        .find(|candidate| target.contains(*candidate))
}

#[cfg(test)]
mod tests {
    use super::find_matching_name;

    #[test]
    fn returns_first_candidate_contained_in_target() {
        let candidates = vec!["Pikku".to_string(), "Pikku Myy".to_string()];
        assert_eq!(
            find_matching_name("Pikku Myy 19,4tm", &candidates),
            Some("Pikku")
        );
    }

    #[test]
    fn order_of_candidates_decides_between_overlapping_names() {
        let candidates = ["Pikku Myy", "Pikku"];
        assert_eq!(
            find_matching_name("Pikku Myy 19,4tm", &candidates),
            Some("Pikku Myy")
        );
    }

    #[test]
    fn returns_none_without_a_contained_candidate() {
        let candidates = ["Tuulen Tytär", "Viesker"];
        assert_eq!(find_matching_name("Hetan Helmi", &candidates), None);
    }

    #[test]
    fn empty_candidate_list_matches_nothing() {
        let candidates: Vec<String> = Vec::new();
        assert_eq!(find_matching_name("Hetan Helmi", &candidates), None);
    }
}
