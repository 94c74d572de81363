//! Repair of over-segmented connective fragments.
//!
//! Transcription sometimes splits a short conjunction ("ve", "ki", ...) into
//! its own segment. Those fragments cannot stand alone as paragraphs, so the
//! merger folds them into an adjacent Turkish paragraph.

use crate::corpus::{Block, BlockType};

/// Closed-class connective lexicon. A block whose words all come from this
/// set is glue.
pub const GLUE_WORDS: &[&str] = &[
    "ve", "ki", "ise", "dahi", "hem", "ya", "de", "da", "ile", "ama", "fakat", "yani", "zira",
    "çünkü", "belki", "hatta",
];

const GLUE_MAX_WORDS: usize = 2;

/// True when every word of the normalized text is a connective and there are
/// at most two of them.
pub fn is_glue(text: &str) -> bool {
    let mut words = 0;
    for word in text.split_whitespace() {
        words += 1;
        if words > GLUE_MAX_WORDS {
            return false;
        }
        let bare: String = lower_turkish(word.trim_matches(|c: char| !c.is_alphanumeric()));
        if bare.is_empty() || !GLUE_WORDS.contains(&bare.as_str()) {
            return false;
        }
    }
    words > 0
}

/// Merge glue blocks into a neighboring paragraph, left to right: prefer
/// prepending into the next block, else appending into the previously emitted
/// one, else emit the glue standalone. Never increases the block count and
/// never injects Turkish glue into an `arabic_block`.
pub fn merge_glue_neighbors(blocks: Vec<Block>) -> Vec<Block> {
    let mut out: Vec<Block> = Vec::with_capacity(blocks.len());
    let mut i = 0;

    while i < blocks.len() {
        let block = &blocks[i];
        if !is_glue(&block.text) {
            out.push(block.clone());
            i += 1;
            continue;
        }

        if let Some(next) = blocks.get(i + 1) {
            if accepts_glue(next) {
                let mut merged = next.clone();
                merged.text = format!("{} {}", block.text, next.text);
                merged.is_glue = false;
                out.push(merged);
                i += 2;
                continue;
            }
        }

        if let Some(prev) = out.last_mut() {
            if accepts_glue(prev) {
                prev.text = format!("{} {}", prev.text, block.text);
                i += 1;
                continue;
            }
        }

        // No eligible neighbor on either side.
        let mut standalone = block.clone();
        standalone.is_glue = true;
        out.push(standalone);
        i += 1;
    }

    out
}

fn accepts_glue(block: &Block) -> bool {
    block.block_type == BlockType::Paragraph && block.lang.as_deref() != Some("ar")
}

fn lower_turkish(word: &str) -> String {
    word.chars()
        .map(|c| match c {
            'İ' => 'i',
            'I' => 'ı',
            _ => c.to_lowercase().next().unwrap_or(c),
        })
        .collect()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn block(block_type: BlockType, text: &str) -> Block {
        Block {
            id: String::new(),
            block_type,
            text: text.to_string(),
            lang: None,
            is_glue: false,
        }
    }

    #[test]
    fn glue_lexicon_word_limit() {
        assert!(is_glue("ve"));
        assert!(is_glue("hem de"));
        assert!(is_glue("Ve"));
        assert!(!is_glue("ve kardeşim"));
        assert!(!is_glue("ve hem de"));
        assert!(!is_glue(""));
    }

    #[test]
    fn merges_into_following_paragraph() {
        let blocks = vec![
            block(BlockType::Paragraph, "ve"),
            block(BlockType::Paragraph, "kardeşim, okumaya başla."),
        ];
        let merged = merge_glue_neighbors(blocks);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].text, "ve kardeşim, okumaya başla.");
        assert_eq!(merged[0].block_type, BlockType::Paragraph);
        assert!(!merged[0].is_glue);
    }

    #[test]
    fn falls_back_to_previous_paragraph() {
        let blocks = vec![
            block(BlockType::Paragraph, "Uzun bir bahis burada biter"),
            block(BlockType::Paragraph, "dahi"),
            block(BlockType::ArabicBlock, "بِسْمِ اللَّهِ الرَّحْمَنِ الرَّحِيمِ"),
        ];
        let merged = merge_glue_neighbors(blocks);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].text, "Uzun bir bahis burada biter dahi");
        assert_eq!(merged[1].block_type, BlockType::ArabicBlock);
    }

    #[test]
    fn never_injects_glue_into_arabic_block() {
        let blocks = vec![
            block(BlockType::ArabicBlock, "الْحَمْدُ لِلَّهِ رَبِّ الْعَالَمِينَ"),
            block(BlockType::Paragraph, "ve"),
            block(BlockType::ArabicBlock, "الرَّحْمَنِ الرَّحِيمِ"),
        ];
        let merged = merge_glue_neighbors(blocks);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[1].text, "ve");
        assert!(merged[1].is_glue);
    }

    #[test]
    fn skips_arabic_tagged_paragraph() {
        let mut ar_paragraph = block(BlockType::Paragraph, "دعاء قصير");
        ar_paragraph.lang = Some("ar".into());
        let blocks = vec![block(BlockType::Paragraph, "ki"), ar_paragraph];
        let merged = merge_glue_neighbors(blocks);
        assert_eq!(merged.len(), 2);
        assert!(merged[0].is_glue);
    }

    #[test]
    fn count_never_increases() {
        let blocks = vec![
            block(BlockType::Paragraph, "ve"),
            block(BlockType::Paragraph, "ki"),
            block(BlockType::Paragraph, "metin burada"),
        ];
        let merged = merge_glue_neighbors(blocks.clone());
        assert!(merged.len() <= blocks.len());
    }
}
