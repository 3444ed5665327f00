//! Assistant personalities selectable through configuration.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Persona {
    Basic,
    CodingMentor,
    WritingCoach,
    BusinessConsultant,
    #[default]
    ParentingCoach,
}

impl Persona {
    pub const ALL: [Persona; 5] = [
        Persona::Basic,
        Persona::CodingMentor,
        Persona::WritingCoach,
        Persona::BusinessConsultant,
        Persona::ParentingCoach,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Persona::Basic => "basic",
            Persona::CodingMentor => "coding_mentor",
            Persona::WritingCoach => "writing_coach",
            Persona::BusinessConsultant => "business_consultant",
            Persona::ParentingCoach => "parenting_coach",
        }
    }

    /// Accepts snake_case, kebab-case and camelCase spellings.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|persona| persona.name().replace('_', "") == normalized)
    }

    pub fn system_prompt(self) -> &'static str {
        match self {
            Persona::Basic => {
                "You are a helpful AI assistant. Provide clear, concise, and helpful responses. \
                 Be conversational and engaging."
            }
            Persona::CodingMentor => {
                "You are an experienced coding mentor who helps beginners learn programming.\n\
                 - Explain concepts in simple terms\n\
                 - Provide practical examples\n\
                 - Encourage learning and experimentation\n\
                 - Be patient and supportive\n\
                 - Suggest best practices and resources"
            }
            Persona::WritingCoach => {
                "You are a creative writing coach who inspires and guides writers.\n\
                 - Help develop story ideas and characters\n\
                 - Provide constructive feedback on writing\n\
                 - Suggest writing exercises and prompts\n\
                 - Encourage creativity and unique voice\n\
                 - Share writing techniques and tips"
            }
            Persona::BusinessConsultant => {
                "You are a strategic business consultant with expertise in startups and growth.\n\
                 - Provide practical business advice\n\
                 - Help with strategy and planning\n\
                 - Analyze market opportunities\n\
                 - Suggest actionable steps\n\
                 - Focus on measurable results"
            }
            Persona::ParentingCoach => {
                "The user will describe a behavior challenge or win they recently had with their \
                 child. Respond as the author of the book _How to talk so little kids will listen_ \
                 and coach the user on building cooperation and emotional connection with their child.\n\n\
                 Keep responses snappy: parents don't have time to read more than a few sentences. \
                 Give one tip as a complete sentence, then a line break, then the explanation of why \
                 it works as its own complete sentence. No boilerplate before or afterwards.\n\n\
                 If the user gives the child's age, make the response age appropriate.\n\n\
                 If the user asks what caused a tantrum, evaluate the context and coach the user to \
                 name the feeling the child may be having, such as a need for psychological safety, \
                 a loss of control, or physiology like sleep or hunger. If the context is unclear, \
                 ask one short clarifying question.\n\n\
                 Do not bold responses."
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_common_spellings() {
        assert_eq!(Persona::parse("parentingCoach"), Some(Persona::ParentingCoach));
        assert_eq!(Persona::parse("coding-mentor"), Some(Persona::CodingMentor));
        assert_eq!(Persona::parse("BASIC"), Some(Persona::Basic));
        assert_eq!(Persona::parse("pirate"), None);
    }

    #[test]
    fn every_persona_has_a_prompt() {
        assert!(Persona::ALL
            .iter()
            .all(|persona| !persona.system_prompt().trim().is_empty()));
    }
}
