//! Interactive question loop

use std::io::{BufRead, Write};

use crate::answer::QaContext;
use crate::embeddings::TextEncoder;
use crate::error::CorpusError;

pub const PROMPT: &str = "\n請輸入你的問題（輸入 'exit' 結束）：";
pub const ANSWER_PREFIX: &str = "\nAI 回答：\n";

/// Read questions line by line until `exit` (any case) or end of input,
/// writing one answer per question
pub fn run_repl<E, R, W>(context: &QaContext<E>, mut input: R, mut output: W) -> Result<(), CorpusError>
where
    E: TextEncoder,
    R: BufRead,
    W: Write,
{
    let mut line = String::new();
    loop {
        write!(output, "{}", PROMPT)?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }

        let question = line.trim_end_matches(['\r', '\n']);
        if question.to_lowercase() == "exit" {
            break;
        }

        let answer = context.answer(question)?;
        writeln!(output, "{}{}", ANSWER_PREFIX, answer)?;
    }
    Ok(())
}
