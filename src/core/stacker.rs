//! Collapsing of repeated operations
//!
//! Members often deposit or withdraw the same amount several times in a row.
//! Those runs are stored as a single entry carrying a repeat count.

use crate::types::Operation;

/// Merge `next` into `previous` if they record the same thing
///
/// Two operations stack when their kind, amount, username and sender are all
/// equal. The merged entry keeps the timestamp of `previous`.
///
/// # Returns
///
/// * `Some(merged)` - `previous` with its repeat count incremented
/// * `None` - the operations differ, `previous` must be sealed as is
pub fn stack(previous: &Operation, next: &Operation) -> Option<Operation> {
    if previous.kind != next.kind {
        return None;
    }

    let mut merged = previous.clone();
    merged.repeat_count += 1;
    Some(merged)
}

/// Append `incoming` to `operations`, stacking each one onto the current tail
///
/// The last operation already present is popped and used as the pending
/// tail, so a run that started in a previous batch keeps growing. Operations
/// are never reordered.
pub fn fold_into(operations: &mut Vec<Operation>, incoming: Vec<Operation>) {
    let mut tail = operations.pop();

    for operation in incoming {
        tail = match tail {
            Some(previous) => match stack(&previous, &operation) {
                Some(merged) => Some(merged),
                None => {
                    operations.push(previous);
                    Some(operation)
                }
            },
            None => Some(operation),
        };
    }

    if let Some(last) = tail {
        operations.push(last);
    }
}
