use std::time::{Duration, Instant};

pub(crate) fn trace(l_type: &str, l_step: &str, start: Instant, prev_elapsed: Duration) -> Duration {
    log::trace!("{} | Total={:.2?} | {}={:.2?}", l_type, start.elapsed(), l_step, start.elapsed() - prev_elapsed);
    start.elapsed()
}

/// Index and value of the first maximum, skipping NaN.
pub(crate) fn first_max<'a, I>(values: I) -> Option<(usize, f32)>
where
    I: IntoIterator<Item = &'a f32>,
{
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.into_iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        if best.map_or(true, |(_, b)| v > b) {
            best = Some((i, v));
        }
    }
    best
}
