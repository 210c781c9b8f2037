use crate::model::{AgeBucket, Gender};
use lazy_static::lazy_static;
use serde::Serialize;

/// Static catalog entry for one prebuilt TTS voice. Reference data only,
/// never mutated by the pipeline.
#[derive(Serialize, Clone, Debug)]
pub struct VoiceProfile {
    pub name: &'static str,
    pub gender: Gender,
    pub age: AgeBucket,
    pub accent: &'static str,
    pub tone: &'static str,
    pub style: &'static str,
    pub description: &'static str,
}

macro_rules! voice {
    ($name:expr, $gender:ident, $age:ident, $accent:expr, $tone:expr, $style:expr, $desc:expr) => {
        VoiceProfile {
            name: $name,
            gender: Gender::$gender,
            age: AgeBucket::$age,
            accent: $accent,
            tone: $tone,
            style: $style,
            description: $desc,
        }
    };
}

lazy_static! {
    /// All 30 prebuilt voices with curated characteristics.
    pub static ref VOICE_CATALOG: Vec<VoiceProfile> = vec![
        // Male voices
        voice!("charon", Male, Old, "Neutral",
            "deep, authoritative, mysterious",
            "wise, contemplative, deliberate",
            "Deep, resonant male voice with authoritative presence. Suitable for wise mentors, ancient characters, or mysterious figures. Slow, deliberate pace with gravitas."),
        voice!("fenrir", Male, Middle, "Neutral",
            "strong, confident, commanding",
            "professional, authoritative, powerful",
            "Strong, confident male voice with commanding presence. Suitable for warriors, leaders, detectives, or professionals. Clear and assertive."),
        voice!("achernar", Male, Old, "Neutral",
            "calm, deeply resonant, wise",
            "contemplative, ancient, mystical",
            "Calm, deeply resonant male voice with ancient wisdom. Suitable for shamans, sages, or mystical characters. Grounded and contemplative."),
        voice!("achird", Male, Middle, "Neutral",
            "clear, professional, articulate",
            "professional, confident, reliable",
            "Clear, professional male voice. Suitable for business professionals, teachers, or reliable characters. Articulate and confident."),
        voice!("algenib", Male, Middle, "Neutral",
            "warm, friendly, approachable",
            "casual, friendly, conversational",
            "Warm, friendly male voice. Suitable for friends, casual characters, or approachable figures. Conversational and inviting."),
        voice!("algieba", Male, Young, "Neutral",
            "energetic, bright, enthusiastic",
            "casual, youthful, animated",
            "Energetic, bright male voice. Suitable for young characters, students, or enthusiastic personalities. Animated and lively."),
        voice!("alnilam", Male, Middle, "Neutral",
            "steady, reliable, calm",
            "professional, steady, dependable",
            "Steady, reliable male voice. Suitable for dependable characters, mentors, or calm professionals. Consistent and trustworthy."),
        voice!("enceladus", Male, Old, "Neutral",
            "deep, thoughtful, measured",
            "wise, patient, contemplative",
            "Deep, thoughtful male voice. Suitable for wise elders, philosophers, or patient mentors. Measured and contemplative."),
        voice!("gacrux", Male, Middle, "Neutral",
            "strong, clear, confident",
            "authoritative, clear, decisive",
            "Strong, clear male voice. Suitable for leaders, commanders, or decisive characters. Confident and authoritative."),
        voice!("iapetus", Male, Old, "Neutral",
            "deep, resonant, ancient",
            "mysterious, ancient, powerful",
            "Deep, resonant male voice with ancient quality. Suitable for ancient beings, powerful entities, or mysterious figures. Powerful and timeless."),
        voice!("orus", Male, Middle, "European",
            "stern, authoritative, no-nonsense",
            "professional, confrontational, rugged",
            "Stern, authoritative male voice with European accent. Suitable for chefs, professionals, or no-nonsense characters. Rugged and confrontational."),
        voice!("puck", Male, Young, "Neutral",
            "energetic, expressive, animated",
            "comedic, playful, quick-witted",
            "Energetic, expressive male voice. Suitable for comedic characters, tricksters, or playful personalities. Animated and quick-witted."),
        voice!("rasalgethi", Male, Middle, "Neutral",
            "warm, rich, engaging",
            "friendly, charismatic, warm",
            "Warm, rich male voice. Suitable for charismatic characters, storytellers, or engaging personalities. Warm and inviting."),
        voice!("sadachbia", Male, Middle, "Neutral",
            "clear, professional, articulate",
            "professional, clear, reliable",
            "Clear, professional male voice. Suitable for professionals, teachers, or reliable characters. Articulate and dependable."),
        voice!("sadaltager", Male, Old, "Neutral",
            "deep, wise, patient",
            "wise, patient, contemplative",
            "Deep, wise male voice. Suitable for wise mentors, elders, or patient guides. Patient and contemplative."),
        voice!("schedar", Male, Middle, "Neutral",
            "steady, reliable, calm",
            "professional, steady, dependable",
            "Steady, reliable male voice. Suitable for dependable characters, professionals, or calm figures. Consistent and trustworthy."),
        voice!("umbriel", Male, Old, "Neutral",
            "deep, mysterious, dark",
            "mysterious, dark, refined",
            "Deep, mysterious male voice. Suitable for dark characters, vampires, or mysterious figures. Refined and dark."),
        voice!("vindemiatrix", Male, Middle, "Neutral",
            "clear, professional, confident",
            "professional, confident, articulate",
            "Clear, professional male voice. Suitable for professionals, leaders, or confident characters. Articulate and confident."),
        voice!("zephyr", Neutral, Young, "Neutral",
            "bright, light, airy",
            "versatile, adaptable, clear",
            "Bright, light neutral voice. Suitable for versatile characters, adaptable personalities, or neutral figures. Clear and adaptable."),
        voice!("zubenelgenubi", Male, Middle, "Neutral",
            "warm, rich, engaging",
            "friendly, charismatic, warm",
            "Warm, rich male voice. Suitable for friendly characters, storytellers, or engaging personalities. Warm and inviting."),
        // Female voices
        voice!("aoede", Female, Middle, "Neutral",
            "clear, professional, confident",
            "professional, articulate, sassy",
            "Clear, professional female voice. Suitable for professionals, sassy characters, or confident women. Articulate and expressive."),
        voice!("autonoe", Female, Young, "Neutral",
            "bright, energetic, lively",
            "youthful, energetic, animated",
            "Bright, energetic female voice. Suitable for young characters, students, or lively personalities. Animated and enthusiastic."),
        voice!("callirrhoe", Female, Middle, "Neutral",
            "warm, friendly, approachable",
            "friendly, conversational, inviting",
            "Warm, friendly female voice. Suitable for friends, supportive characters, or approachable figures. Conversational and warm."),
        voice!("despina", Female, Young, "Neutral",
            "sweet, gentle, soft",
            "gentle, kind, soothing",
            "Sweet, gentle female voice. Suitable for kind characters, gentle personalities, or soothing figures. Soft and caring."),
        voice!("erinome", Female, Middle, "Neutral",
            "clear, articulate, professional",
            "professional, clear, confident",
            "Clear, articulate female voice. Suitable for professionals, teachers, or confident women. Professional and clear."),
        voice!("kore", Female, Middle, "Neutral",
            "firm, warm, friendly",
            "friendly, warm, conversational",
            "Firm, warm female voice. Suitable for friendly characters, best friends, or warm personalities. Conversational and inviting."),
        voice!("laomedeia", Female, Young, "Neutral",
            "bright, cheerful, energetic",
            "youthful, cheerful, animated",
            "Bright, cheerful female voice. Suitable for young characters, cheerful personalities, or energetic figures. Animated and lively."),
        voice!("leda", Female, Middle, "Neutral",
            "sophisticated, elegant, refined",
            "elegant, refined, sophisticated",
            "Sophisticated, elegant female voice. Suitable for refined characters, elegant personalities, or sophisticated figures. Refined and polished."),
        voice!("pulcherrima", Female, Middle, "Neutral",
            "sophisticated, elegant, refined",
            "elegant, refined, beautiful",
            "Sophisticated, elegant female voice. Suitable for refined characters, elegant personalities, or beautiful figures. Elegant and polished."),
        voice!("sulafat", Female, Middle, "Neutral",
            "warm, gentle, soothing",
            "gentle, kind, caring",
            "Warm, gentle female voice. Suitable for caring characters, gentle personalities, or soothing figures. Kind and nurturing."),
    ];
}

pub fn all_voice_names() -> Vec<&'static str> {
    VOICE_CATALOG.iter().map(|v| v.name).collect()
}

pub fn get_voice(name: &str) -> Option<&'static VoiceProfile> {
    let lower = name.to_lowercase();
    VOICE_CATALOG.iter().find(|v| v.name == lower)
}

pub fn voices_by_gender(gender: Gender) -> Vec<&'static VoiceProfile> {
    VOICE_CATALOG.iter().filter(|v| v.gender == gender).collect()
}
