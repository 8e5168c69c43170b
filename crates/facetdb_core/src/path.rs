//! Path-addressable access into `Value` trees.
//!
//! Path expressions use dotted and bracketed segments (`a.b[2].c`);
//! numeric segments address array positions, everything else addresses
//! map keys. The store resolves the first segment to the top-level
//! record key and applies the rest here.

use crate::error::{CoreError, CoreResult};
use facetdb_collate::Value;

/// Split a path expression into segments.
///
/// Splits on `.`, `[` and `]`, dropping empty segments, so `a.b[2]`
/// and `a.b.2` address the same location.
///
/// # Errors
///
/// Returns [`CoreError::InvalidPath`] if no segments remain.
pub fn parse(path: &str) -> CoreResult<Vec<String>> {
    let segments: Vec<String> = path
        .split(['.', '[', ']'])
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if segments.is_empty() {
        return Err(CoreError::invalid_path(path, "empty path"));
    }
    Ok(segments)
}

/// Read the value at `segments`, or `None` if the path does not exist.
pub fn get<'a>(target: &'a Value, segments: &[String]) -> Option<&'a Value> {
    let mut current = target;
    for segment in segments {
        current = match current {
            Value::Map(_) => current.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn get_mut<'a>(target: &'a mut Value, segments: &[String]) -> Option<&'a mut Value> {
    let mut current = target;
    for segment in segments {
        current = match current {
            Value::Map(_) => current.get_mut(segment)?,
            Value::Array(items) => items.get_mut(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Write `new_value` at `segments`, creating intermediate containers.
///
/// A missing or scalar node along the way is replaced by an array when
/// the next segment is numeric and a map otherwise. Array indices must
/// be in bounds or one-past-the-end.
///
/// # Errors
///
/// Returns [`CoreError::InvalidPath`] for a non-numeric segment on an
/// array or an out-of-bounds index. `path` is only used for reporting.
pub fn set(target: &mut Value, path: &str, segments: &[String], new_value: Value) -> CoreResult<()> {
    let Some((head, rest)) = segments.split_first() else {
        *target = new_value;
        return Ok(());
    };
    let index = head.parse::<usize>().ok();

    match target {
        Value::Map(pairs) => {
            let pos = match pairs.binary_search_by(|(k, _)| k.as_str().cmp(head)) {
                Ok(pos) => pos,
                Err(pos) => {
                    pairs.insert(pos, (head.clone(), Value::Null));
                    pos
                }
            };
            set(&mut pairs[pos].1, path, rest, new_value)
        }
        Value::Array(items) => {
            let Some(i) = index else {
                return Err(CoreError::invalid_path(
                    path,
                    format!("'{head}' is not an array index"),
                ));
            };
            if i > items.len() {
                return Err(CoreError::invalid_path(
                    path,
                    format!("index {i} is out of bounds (len {})", items.len()),
                ));
            }
            if i == items.len() {
                items.push(Value::Null);
            }
            set(&mut items[i], path, rest, new_value)
        }
        _ => {
            // Reshape the node to fit the segment, then try again.
            *target = if index.is_some() {
                Value::Array(Vec::new())
            } else {
                Value::Map(Vec::new())
            };
            set(target, path, segments, new_value)
        }
    }
}

/// Remove the value at `segments`. Missing paths are a no-op.
pub fn delete(target: &mut Value, segments: &[String]) {
    let Some((last, parents)) = segments.split_last() else {
        return;
    };
    let Some(parent) = get_mut(target, parents) else {
        return;
    };
    match parent {
        Value::Map(_) => {
            parent.remove(last);
        }
        Value::Array(items) => {
            if let Ok(i) = last.parse::<usize>() {
                if i < items.len() {
                    items.remove(i);
                }
            }
        }
        _ => {}
    }
}
