/// Every candidate failed.
#[derive(Debug)]
pub struct Exhausted<E> {
    pub attempts: usize,
    /// `None` when there were no candidates at all.
    pub last_error: Option<E>,
}

/// Tries `attempt` on each candidate in order and returns the first success
/// along with the candidate that produced it. Candidates after the first
/// success are never touched.
pub fn first_success<C, T, E, I, F>(candidates: I, mut attempt: F) -> Result<(C, T), Exhausted<E>>
where
    I: IntoIterator<Item = C>,
    F: FnMut(&C) -> Result<T, E>,
{
    let mut attempts = 0;
    let mut last_error = None;
    for candidate in candidates {
        attempts += 1;
        match attempt(&candidate) {
            Ok(value) => return Ok((candidate, value)),
            Err(e) => last_error = Some(e),
        }
    }
    Err(Exhausted {
        attempts,
        last_error,
    })
}
