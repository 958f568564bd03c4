//! Prompt templates for the two illustrations.

/// Prompt for the text-to-image keyword illustration.
pub fn keyword_prompt(keywords: &str) -> String {
    format!(
        "A warm, hand-drawn picture diary illustration of a day described by \
         these keywords: {}. Soft pastel colours, crayon texture, no text or letters.",
        keywords.trim()
    )
}

/// Prompt for the image-edit character illustration.
pub fn character_prompt(keywords: &str, subject_type: &str) -> String {
    format!(
        "Redraw this {} character as the hero of a picture diary page about: {}. \
         Keep the character's face, colours and proportions. Same hand-drawn \
         crayon style, simple background, no text or letters.",
        subject_type.trim(),
        keywords.trim()
    )
}
