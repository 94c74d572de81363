pub mod classify;
pub mod glue;
pub mod normalize;

use crate::corpus::{Block, BlockType, RawSegment};
use crate::ident;

/// Three-pass pipeline: raw segments → normalize → classify → glue merge,
/// then deterministic IDs over the final ordinals. Empty segments are
/// dropped; every emitted block carries normalized text and an ID.
pub fn ingest_segments(book_id: &str, section_id: &str, segments: &[RawSegment]) -> Vec<Block> {
    let mut blocks = Vec::with_capacity(segments.len());

    for segment in segments {
        let text = normalize::normalize(&segment.text);
        if text.is_empty() {
            continue;
        }
        let explicit = segment
            .segment_type
            .as_deref()
            .and_then(BlockType::from_label);
        let block_type = classify::classify(&text, explicit);
        blocks.push(Block {
            id: String::new(),
            block_type,
            text,
            lang: segment.lang.clone(),
            is_glue: false,
        });
    }

    let mut blocks = glue::merge_glue_neighbors(blocks);
    for (ordinal, block) in blocks.iter_mut().enumerate() {
        block.id = ident::generate_block_id(book_id, section_id, ordinal as u32, &block.text);
    }
    blocks
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(text: &str) -> RawSegment {
        RawSegment {
            id: None,
            text: text.to_string(),
            segment_type: None,
            lang: None,
        }
    }

    #[test]
    fn glue_merge_shrinks_stream_and_ids_are_assigned() {
        let segments = vec![raw("ve"), raw("kardeşim,  okumaya başla.")];
        let blocks = ingest_segments("sozler", "s-abc123def456", &segments);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, "ve kardeşim, okumaya başla.");
        assert_eq!(blocks[0].block_type, BlockType::Paragraph);
        assert!(blocks[0].id.starts_with("sozler:s-abc123def456:0:"));
    }

    #[test]
    fn explicit_type_survives_pipeline() {
        let mut seg = raw("İHTAR");
        seg.segment_type = Some("label".into());
        let blocks = ingest_segments("sozler", "s-abc", &[seg]);
        assert_eq!(blocks[0].block_type, BlockType::Label);
    }

    #[test]
    fn invalid_explicit_type_falls_through() {
        let mut seg = raw("بِسْمِ اللَّهِ الرَّحْمَنِ الرَّحِيمِ");
        seg.segment_type = Some("verse".into());
        let blocks = ingest_segments("sozler", "s-abc", &[seg]);
        assert_eq!(blocks[0].block_type, BlockType::ArabicBlock);
    }

    #[test]
    fn empty_segments_are_dropped() {
        let blocks = ingest_segments("sozler", "s-abc", &[raw("   "), raw("metin")]);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, "metin");
    }

    #[test]
    fn reingestion_reproduces_ids() {
        let segments = vec![raw("Birinci nokta budur."), raw("İkinci nokta şudur.")];
        let first = ingest_segments("mektubat", "s-def", &segments);
        let second = ingest_segments("mektubat", "s-def", &segments);
        let ids_a: Vec<&str> = first.iter().map(|b| b.id.as_str()).collect();
        let ids_b: Vec<&str> = second.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids_a, ids_b);
    }
}
