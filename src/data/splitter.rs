// ============================================================
// Layer 4 — Train/Evaluation Splitter
// ============================================================
// Splits rows into two sets by position:
//   - Training set:   rows [0 .. train_rows)
//   - Evaluation set: rows [train_rows .. len)
//
// The split point is a configuration constant (38000 rows for
// the full captioning dataset). No shuffling happens here: the
// training data loader shuffles batches on its own.
//
// Reference: Rust Book §8 (Vectors)

/// Split `samples` into (train, eval) at row `train_rows`.
///
/// If `train_rows` exceeds the number of samples, every row goes
/// to training and the evaluation set is empty.
///
/// # Example
/// ```ignore
/// let (train, eval) = split_at_row(rows, 38_000);
/// ```
pub fn split_at_row<T>(mut samples: Vec<T>, train_rows: usize) -> (Vec<T>, Vec<T>) {
    let total    = samples.len();
    let split_at = train_rows.min(total);

    // split_off(n) leaves [0..n) in `samples` and returns [n..total)
    let eval = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split at row {}: {} training, {} evaluation",
        split_at,
        samples.len(),
        eval.len(),
    );

    (samples, eval)
}
