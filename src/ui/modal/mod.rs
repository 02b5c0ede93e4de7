//! Modal dialogs: the describe editor and single-line prompts.

mod describe;
mod prompt;

pub use describe::{DescribeKeyResult, DescribeModal, DescribeModalState};
pub use prompt::{PromptModal, PromptModalState, PromptPurpose};

/// Byte offset of the `char_pos`-th character of `line`, clamped to the end.
/// Cursor positions count characters; `String` edits need byte indices.
fn char_to_byte(line: &str, char_pos: usize) -> usize {
    line.char_indices()
        .nth(char_pos)
        .map(|(i, _)| i)
        .unwrap_or(line.len())
}
