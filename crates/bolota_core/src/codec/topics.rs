//! Topic forest flattening and depth-based reconstruction.
//!
//! # Responsibility
//! - Flatten the topic tree into pre-order records tagged with live depth.
//! - Rebuild the tree from such a sequence.
//!
//! # Invariants
//! - Depth may drop by any amount between records but rise by at most one.
//! - Sibling order on the wire is sibling order in the tree.
//! - A failed decode returns no tree.

use super::record::{decode_record, encode_record, ByteReader};
use super::{CodecResult, FormatError};
use crate::icon::IconCatalog;
use crate::model::tree::{FieldId, FieldTree};
use log::debug;

/// Encodes every topic below the tree root in pre-order.
pub fn encode_topics(tree: &FieldTree) -> CodecResult<Vec<u8>> {
    let mut out = Vec::new();
    let mut count = 0usize;
    for (id, depth) in tree.preorder(tree.root()) {
        if let Some(field) = tree.get(id) {
            encode_record(field, depth, &mut out)?;
            count += 1;
        }
    }
    debug!(
        "event=topics_encode module=codec status=ok topics={} bytes={}",
        count,
        out.len()
    );
    Ok(out)
}

/// Rebuilds the topic tree from a topics section.
///
/// `open` holds the most recent node at each depth, with the root in slot 0,
/// so a record at depth `d` is attached under `open[d]`.
///
/// # Errors
/// - [`FormatError::DepthJump`] when a record descends more than one level.
/// - Any record-level error from the shared record decoder.
pub fn decode_topics(section: &[u8], catalog: &dyn IconCatalog) -> CodecResult<FieldTree> {
    let mut tree = FieldTree::new();
    let mut open: Vec<FieldId> = vec![tree.root()];
    let mut reader = ByteReader::new(section);

    while reader.remaining() > 0 {
        let record = decode_record(&mut reader, catalog)?;
        let depth = usize::from(record.depth);
        if depth >= open.len() {
            return Err(FormatError::DepthJump {
                offset: record.offset,
                previous: open.len() as i32 - 2,
                found: record.depth,
            }
            .into());
        }

        open.truncate(depth + 1);
        let id = match tree.append_new(open[depth], record.field) {
            Ok(id) => id,
            Err(err) => unreachable!("open ancestors always belong to the tree: {err}"),
        };
        open.push(id);
    }

    debug!(
        "event=topics_decode module=codec status=ok topics={} bytes={}",
        tree.len(),
        section.len()
    );
    Ok(tree)
}
