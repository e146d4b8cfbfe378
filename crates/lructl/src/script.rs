//! Replay scripts in the two-array form
//!
//! ```text
//! ["LRUCache","put","put","get"]
//! [[2],[1,1],[2,2],[1]]
//! ```
//!
//! The two arrays may also be wrapped in one outer array. The first operation
//! must construct the cache.

use lrucache::LruCache;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Problems with a replay script
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected an operations array and an arguments array, found {0} JSON values")]
    Layout(usize),

    #[error("{ops} operations but {args} argument lists")]
    LengthMismatch { ops: usize, args: usize },

    #[error("script must start with LRUCache")]
    MissingConstructor,

    #[error("step {step}: unknown operation '{op}'")]
    UnknownOp { step: usize, op: String },

    #[error("step {step}: '{op}' takes {expected} argument(s), got {got}")]
    Arity {
        step: usize,
        op: String,
        expected: usize,
        got: usize,
    },

    #[error("step {step}: capacity {value} is out of range")]
    Capacity { step: usize, value: i64 },

    #[error("step {step}: {source}")]
    Cache {
        step: usize,
        #[source]
        source: lrucache::Error,
    },
}

/// A parsed script: operation names and their integer arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    ops: Vec<String>,
    args: Vec<Vec<i64>>,
}

impl Script {
    /// Parse a script from JSON text
    pub fn parse(input: &str) -> Result<Self, ScriptError> {
        let values = serde_json::Deserializer::from_str(input)
            .into_iter::<Value>()
            .collect::<Result<Vec<_>, _>>()?;

        let (ops, args): (Vec<String>, Vec<Vec<i64>>) = match values.len() {
            1 => serde_json::from_value(values.into_iter().next().unwrap_or(Value::Null))?,
            2 => {
                let mut values = values.into_iter();
                let ops = serde_json::from_value(values.next().unwrap_or(Value::Null))?;
                let args = serde_json::from_value(values.next().unwrap_or(Value::Null))?;
                (ops, args)
            }
            n => return Err(ScriptError::Layout(n)),
        };

        if ops.len() != args.len() {
            return Err(ScriptError::LengthMismatch {
                ops: ops.len(),
                args: args.len(),
            });
        }

        Ok(Self { ops, args })
    }

    /// Number of steps, including the constructor
    pub fn steps(&self) -> usize {
        self.ops.len()
    }

    /// Execute every step and collect one output per step
    ///
    /// Constructor and `put` steps yield `null`. A `get` hit yields the value;
    /// a miss yields `missing` when given, otherwise `null`.
    pub fn run(&self, missing: Option<i64>) -> Result<Vec<Value>, ScriptError> {
        let mut steps = self.ops.iter().zip(&self.args).enumerate();

        let mut cache = match steps.next() {
            Some((step, (op, args))) if op == "LRUCache" => {
                let [capacity] = expect_args::<1>(step, op, args)?;
                let capacity = usize::try_from(capacity)
                    .map_err(|_| ScriptError::Capacity { step, value: capacity })?;
                LruCache::<i64, i64>::new(capacity)
                    .map_err(|source| ScriptError::Cache { step, source })?
            }
            _ => return Err(ScriptError::MissingConstructor),
        };

        let mut output = Vec::with_capacity(self.steps());
        output.push(Value::Null);

        for (step, (op, args)) in steps {
            match op.as_str() {
                "put" => {
                    let [key, value] = expect_args::<2>(step, op, args)?;
                    cache.put(key, value);
                    output.push(Value::Null);
                }
                "get" => {
                    let [key] = expect_args::<1>(step, op, args)?;
                    let result = match cache.get(&key) {
                        Some(&value) => Value::from(value),
                        None => missing.map_or(Value::Null, Value::from),
                    };
                    output.push(result);
                }
                _ => {
                    return Err(ScriptError::UnknownOp {
                        step,
                        op: op.clone(),
                    })
                }
            }
        }

        debug!(
            steps = self.steps(),
            hits = cache.stats().hits(),
            misses = cache.stats().misses(),
            evictions = cache.stats().evictions(),
            "script finished"
        );

        Ok(output)
    }
}

fn expect_args<const N: usize>(
    step: usize,
    op: &str,
    args: &[i64],
) -> Result<[i64; N], ScriptError> {
    <[i64; N]>::try_from(args).map_err(|_| ScriptError::Arity {
        step,
        op: op.to_string(),
        expected: N,
        got: args.len(),
    })
}
