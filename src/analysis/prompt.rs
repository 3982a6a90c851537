// Fixed prompt template for textile/carpet pattern analysis

/// System prompt describing voice, rules and the exact JSON shape expected.
pub const SYSTEM_PROMPT: &str = include_str!("../../prompts/pattern_analysis.txt");

/// Instruction sent alongside the image in the user turn.
pub const USER_INSTRUCTION: &str = "Analyze this textile/carpet pattern. Return JSON only. \
IMPORTANT: You must include the cultural_shifts object and pattern_profile array \
(5 scored attributes) - these are required.";
