//! The configuration negotiator: drives an ordered fallback chain of
//! candidate attribute lists until the driver accepts one.
//!
//! Driver support for the newest capability tokens is never guaranteed, so
//! every backend degrades through a fixed list of progressively less
//! demanding configurations rather than failing on the first rejection.

use error::{Error, Result};

/// One labelled candidate in a fallback chain.
pub struct Candidate<A: 'static> {
    /// Human-readable name, for logging only.
    pub label: &'static str,
    /// The backend-specific attribute list.
    pub attribs: A,
}

/// Tries `candidates` in order and returns the value produced by the first
/// one the driver accepts.
///
/// Candidates past the first accepted one are never attempted. When the
/// whole chain is rejected, fails with `NoMatchingConfiguration` naming the
/// native `call` involved.
pub fn negotiate<A, T, F>(call: &'static str, candidates: &[Candidate<A>], mut try_one: F) -> Result<T>
    where F: FnMut(&A) -> Option<T>
{
    for candidate in candidates {
        match try_one(&candidate.attribs) {
            Some(accepted) => {
                info!("Driver accepted the `{}` configuration", candidate.label);
                return Ok(accepted);
            },
            None => warn!("Driver rejected the `{}` configuration, falling back", candidate.label),
        }
    }
    Err(Error::no_matching_configuration(call))
}

#[cfg(test)]
mod tests {
    use super::*;
    use error::ErrorKind;

    fn chain() -> [Candidate<i32>; 4] {
        [
            Candidate { label: "a", attribs: 10 },
            Candidate { label: "b", attribs: 20 },
            Candidate { label: "c", attribs: 30 },
            Candidate { label: "d", attribs: 40 },
        ]
    }

    #[test]
    fn picks_the_first_accepted_candidate_and_stops() {
        // Simulated driver that rejects the first two candidates.
        let mut attempts = Vec::new();
        let picked = negotiate("test", &chain(), |&attribs| {
            attempts.push(attribs);
            if attempts.len() > 2 { Some(attribs) } else { None }
        }).unwrap();
        assert_eq!(picked, 30);
        // Order-preserving, and nothing past the accepted one was tried.
        assert_eq!(attempts, [10, 20, 30]);
    }

    #[test]
    fn first_candidate_wins_when_accepted() {
        let mut attempts = 0;
        let picked = negotiate("test", &chain(), |&attribs| {
            attempts += 1;
            Some(attribs)
        }).unwrap();
        assert_eq!(picked, 10);
        assert_eq!(attempts, 1);
    }

    #[test]
    fn exhausting_the_chain_is_no_matching_configuration() {
        let err = negotiate::<_, i32, _>("glXChooseVisual", &chain(), |_| None).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NoMatchingConfiguration);
        assert_eq!(err.call.as_ref().map(|c| &c[..]), Some("glXChooseVisual"));
    }
}
