//! Loop broadcasting.
//!
//! Every node evaluates over the longest of its input loops; shorter loops
//! cycle by modulo index. Per-index operations are lifted through [`looped`]
//! rather than indexing loops by hand.

use crate::models::values::{Loop, PortValue};

/// Longest input loop, never less than 1.
pub fn longest_loop_length(loops: &[Loop]) -> usize {
    loops.iter().map(Vec::len).max().unwrap_or(1).max(1)
}

/// Index into a loop of `len` values, wrapping. Zero for an empty loop.
pub fn adjusted_index(index: usize, len: usize) -> usize {
    if len == 0 {
        0
    } else {
        index % len
    }
}

/// Value of `loops[port]` at broadcast index `index`.
pub fn value_at(loops: &[Loop], port: usize, index: usize) -> PortValue {
    loops
        .get(port)
        .and_then(|values| values.get(adjusted_index(index, values.len())))
        .cloned()
        .unwrap_or(PortValue::None)
}

/// Cycles `values` until it holds `len` entries. Longer loops are returned unchanged.
pub fn lengthen(values: &[PortValue], len: usize) -> Loop {
    if values.is_empty() || values.len() >= len {
        return values.to_vec();
    }
    (0..len)
        .map(|i| values[adjusted_index(i, values.len())].clone())
        .collect()
}

/// Broadcasts `op` over the input loops.
///
/// `op` receives the values at one broadcast index (one per input row) plus
/// that index, and returns one value per output row.
pub fn looped<F>(inputs: &[Loop], output_count: usize, mut op: F) -> Vec<Loop>
where
    F: FnMut(&[PortValue], usize) -> Vec<PortValue>,
{
    let len = longest_loop_length(inputs);
    let mut outputs: Vec<Loop> = (0..output_count).map(|_| Vec::with_capacity(len)).collect();
    let mut args = Vec::with_capacity(inputs.len());
    for i in 0..len {
        args.clear();
        args.extend((0..inputs.len()).map(|port| value_at(inputs, port, i)));
        let results = op(&args, i);
        for (out, value) in outputs.iter_mut().zip(results) {
            out.push(value);
        }
    }
    outputs
}

/// [`looped`] for single-output operations.
pub fn looped_single<F>(inputs: &[Loop], mut op: F) -> Vec<Loop>
where
    F: FnMut(&[PortValue]) -> PortValue,
{
    looped(inputs, 1, |args, _| vec![op(args)])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(values: &[f64]) -> Loop {
        values.iter().copied().map(PortValue::Number).collect()
    }

    #[test]
    fn broadcast_cycles_shorter_loops() {
        let inputs = vec![
            numbers(&[1.0, 2.0, 3.0]),
            numbers(&[10.0]),
            numbers(&[100.0, 200.0, 300.0, 400.0, 500.0]),
        ];
        let seen = std::cell::RefCell::new(Vec::new());
        let outputs = looped_single(&inputs, |args| {
            seen.borrow_mut().push(args.to_vec());
            let sum: f64 = args.iter().map(|v| v.to_number(0.0)).sum();
            PortValue::Number(sum)
        });

        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].len(), 5);
        for (i, args) in seen.borrow().iter().enumerate() {
            assert_eq!(args[0], inputs[0][i % 3]);
            assert_eq!(args[1], inputs[1][i % 1]);
            assert_eq!(args[2], inputs[2][i % 5]);
        }
        assert_eq!(outputs[0][3], PortValue::Number(1.0 + 10.0 + 400.0));
    }

    #[test]
    fn no_inputs_still_runs_once() {
        let outputs = looped(&[], 2, |_, i| {
            vec![PortValue::Number(i as f64), PortValue::Bool(true)]
        });
        assert_eq!(outputs, vec![numbers(&[0.0]), vec![PortValue::Bool(true)]]);
    }

    #[test]
    fn lengthen_cycles_values() {
        assert_eq!(
            lengthen(&numbers(&[1.0, 2.0]), 5),
            numbers(&[1.0, 2.0, 1.0, 2.0, 1.0])
        );
        assert_eq!(lengthen(&numbers(&[1.0, 2.0, 3.0]), 2).len(), 3);
    }

    #[test]
    fn adjusted_index_handles_empty_loops() {
        assert_eq!(adjusted_index(7, 0), 0);
        assert_eq!(adjusted_index(7, 3), 1);
    }
}
