//! Private field removal

use crate::features::directives::PrivatePath;
use crate::shared::models::Value;

/// Delete every private path from `value`. Missing paths are ignored.
pub fn remove_private(value: &mut Value, paths: &[PrivatePath]) {
    for path in paths {
        remove_path(value, &path.segments);
    }
}

fn remove_path(value: &mut Value, segments: &[String]) {
    let Some((last, parents)) = segments.split_last() else {
        return;
    };
    let mut current = value;
    for segment in parents {
        let next = match current {
            Value::Mapping(map) => map.get_mut(segment.as_str()),
            Value::Sequence(items) => match segment.parse::<usize>() {
                Ok(index) => items.get_mut(index),
                Err(_) => None,
            },
            _ => None,
        };
        match next {
            Some(v) => current = v,
            None => return,
        }
    }
    match current {
        Value::Mapping(map) => {
            map.remove(last.as_str());
        }
        Value::Sequence(items) => {
            if let Ok(index) = last.parse::<usize>() {
                if index < items.len() {
                    items.remove(index);
                }
            }
        }
        _ => {}
    }
}
