//! Chain reactions between explosive invaders and their neighbours
//!
//! Invaders whose centres are closer than the chain radius are linked. A
//! detonation destroys everything reachable from the origin through those
//! links, whatever the neighbours' own explosive flag.

use std::collections::HashSet;

use super::state::Invader;

/// Ids of every invader reachable from `origin` through proximity links,
/// in depth-first visiting order with the origin first.
///
/// Works on a read-only view, so the caller removes the victims afterwards.
/// Returns an empty set if `origin` is not in the collection.
pub fn blast_set(invaders: &[Invader], origin: u32, radius: f32) -> Vec<u32> {
    if !invaders.iter().any(|inv| inv.id == origin) {
        return Vec::new();
    }

    let mut visited = HashSet::new();
    let mut order = Vec::new();
    let mut stack = vec![origin];

    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        let Some(current) = invaders.iter().find(|inv| inv.id == id) else {
            continue;
        };
        order.push(id);

        let center = current.center();
        // Push in reverse so neighbours are visited in collection order
        for neighbour in invaders.iter().rev() {
            if !visited.contains(&neighbour.id) && neighbour.center().distance(center) < radius {
                stack.push(neighbour.id);
            }
        }
    }

    order
}
