use crate::models::letter::LetterType;

/// Builds the single-shot generation prompt from both document texts.
/// Requirement 6 differs per variant: cover letters emphasize the match
/// between experience and job requirements, motivation letters emphasize
/// personal goals.
pub fn build_letter_prompt(cv_text: &str, job_description: &str, letter_type: LetterType) -> String {
    let focus = match letter_type {
        LetterType::CoverLetter => "6. Focus on how your experience matches the job requirements",
        LetterType::MotivationLetter => "6. Focus on your personal motivation and career goals",
    };

    format!(
        "As a professional resume writer, create a {letter_name} based on the following:\n\
         \n\
         CV/Resume:\n\
         {cv_text}\n\
         \n\
         Job Description:\n\
         {job_description}\n\
         \n\
         Requirements:\n\
         1. Keep the tone professional and enthusiastic\n\
         2. Highlight relevant experience and skills from the CV that match the job description\n\
         3. Show genuine interest in the role and company\n\
         4. Keep it concise (max 400 words)\n\
         5. Format with proper paragraph breaks\n\
         {focus}\n\
         \n\
         Please write the letter in a clear, modern business format.",
        letter_name = letter_type.display_name(),
    )
}
