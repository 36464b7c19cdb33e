//! Link expansion

use evees_core::{ContentAddress, Data, DataPayload};

/// Outgoing links of a content object, in document order
pub fn expand(data: &Data) -> &[ContentAddress] {
    match &data.payload {
        DataPayload::Text { .. } => &[],
        DataPayload::TextNode { links, .. } => links,
    }
}
