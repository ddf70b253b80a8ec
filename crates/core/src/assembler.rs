use crate::models::StudyPack;

pub const SUMMARY_HEADER: &str = "📘 Summary";
pub const FLASHCARDS_HEADER: &str = "🃏 Flashcards";
pub const QUIZ_HEADER: &str = "❓ Quiz Questions";

/// Packs generation results. The quiz section exists only when requested,
/// whatever `quiz_questions` holds.
pub fn assemble(
    summary: &str,
    flashcards: Option<Vec<String>>,
    quiz_questions: Vec<String>,
    include_quiz: bool,
) -> StudyPack {
    StudyPack {
        summary: summary.trim().to_string(),
        flashcards,
        quiz_questions: include_quiz.then_some(quiz_questions),
    }
}

/// Serializes a pack into the downloadable text artifact.
pub fn render(pack: &StudyPack) -> String {
    let mut out = format!("{SUMMARY_HEADER}\n\n{}\n", pack.summary.trim());

    if let Some(flashcards) = &pack.flashcards {
        push_numbered_section(&mut out, FLASHCARDS_HEADER, flashcards);
    }
    if let Some(questions) = &pack.quiz_questions {
        push_numbered_section(&mut out, QUIZ_HEADER, questions);
    }

    out
}

fn push_numbered_section(out: &mut String, header: &str, items: &[String]) {
    out.push('\n');
    out.push_str(header);
    out.push_str("\n\n");
    for (position, item) in items.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", position + 1, item.trim()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    #[test]
    fn full_pack_renders_three_numbered_sections() {
        let pack = assemble(
            "  Cells divide. ",
            Some(strings(&["What is mitosis?", "What is meiosis?"])),
            strings(&["Name the phases."]),
            true,
        );

        assert_eq!(
            render(&pack),
            "📘 Summary\n\nCells divide.\n\n\
             🃏 Flashcards\n\n1. What is mitosis?\n2. What is meiosis?\n\n\
             ❓ Quiz Questions\n\n1. Name the phases.\n"
        );
    }

    #[test]
    fn quiz_section_is_omitted_when_not_requested() {
        let pack = assemble(
            "Summary.",
            Some(strings(&["Card"])),
            strings(&["Leftover question"]),
            false,
        );

        let rendered = render(&pack);
        assert!(pack.quiz_questions.is_none());
        assert!(!rendered.contains(QUIZ_HEADER));
        assert!(!rendered.contains("Leftover question"));
    }

    #[test]
    fn requested_quiz_with_no_questions_keeps_its_header() {
        let pack = assemble("Summary.", Some(Vec::new()), Vec::new(), true);
        let rendered = render(&pack);
        assert!(rendered.ends_with("❓ Quiz Questions\n\n"));
        assert!(rendered.contains("🃏 Flashcards\n\n\n"));
    }

    #[test]
    fn summary_only_pack_has_a_single_section() {
        let pack = assemble("Just the gist.", None, Vec::new(), false);
        assert_eq!(render(&pack), "📘 Summary\n\nJust the gist.\n");
    }
}
