//! Command-line encoding of sampled assignments for the external worker.

use ht_types::{Algorithm, Assignment, Function, ParamValue};

/// Flags whose values are semantically integral even when sampled from a
/// continuous or quantized distribution (loop-iteration counts, particle
/// counts, look-ahead counts). The worker's parser rejects fractional text
/// for these.
const INTEGRAL_FLAGS: &[&str] = &[
    "--improvements-loop-iteration",
    "--number-of-particles",
    "--neighbour-looks",
];

/// Build the full worker invocation: the configured worker command, the
/// positional `algorithm function step-budget` triple, the run count, and
/// one encoding per assigned flag.
pub fn build_invocation(
    worker_command: &[String],
    algorithm: Algorithm,
    function: Function,
    times: u32,
    assignment: &Assignment,
) -> Vec<String> {
    let mut tokens: Vec<String> = worker_command.to_vec();
    tokens.push(algorithm.id().to_string());
    tokens.push(function.id().to_string());
    tokens.push(function.step_budget().to_string());
    tokens.push("--times".to_string());
    tokens.push(times.to_string());

    for (flag, value) in assignment.iter() {
        encode_flag(&mut tokens, flag, value);
    }

    tokens
}

fn encode_flag(tokens: &mut Vec<String>, flag: &str, value: ParamValue) {
    match value {
        // Present/absent encoding: the flag token alone, or nothing.
        ParamValue::Bool(true) => tokens.push(flag.to_string()),
        ParamValue::Bool(false) => {}
        ParamValue::Int(v) => push_numeric(tokens, flag, v < 0, v.to_string()),
        ParamValue::Float(v) => {
            let text = if INTEGRAL_FLAGS.contains(&flag) {
                (v as i64).to_string()
            } else {
                v.to_string()
            };
            push_numeric(tokens, flag, v < 0.0, text);
        }
    }
}

/// A bare flag token must never be followed by a negative numeric token,
/// or the worker's parser reads the value as another flag. Negative values
/// collapse into a single `flag=value` token instead.
fn push_numeric(tokens: &mut Vec<String>, flag: &str, negative: bool, text: String) {
    if negative {
        tokens.push(format!("{flag}={text}"));
    } else {
        tokens.push(flag.to_string());
        tokens.push(text);
    }
}
