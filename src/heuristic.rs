//! Rule-based voice selection: keyword traits mapped to a tuned voice
//! profile, with a name-based gender guess correcting cross-gender
//! picks. This is the fast, offline alternative to the judge panel.

use crate::model::Gender;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Diction {
    Slow,
    Casual,
    Normal,
    Precise,
    Fast,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Emphasis {
    Low,
    Medium,
    High,
}

/// Delivery tuning for one character: which voice to use and how it
/// should read.
#[derive(Serialize, Clone, Debug)]
pub struct VoiceTuning {
    pub voice_name: &'static str,
    pub speed: f64,
    pub pitch: f64,
    pub style_hint: &'static str,
    pub diction: Diction,
    pub emphasis: Emphasis,
}

impl VoiceTuning {
    fn new(
        voice_name: &'static str,
        speed: f64,
        pitch: f64,
        style_hint: &'static str,
        diction: Diction,
        emphasis: Emphasis,
    ) -> Self {
        Self {
            voice_name,
            speed,
            pitch,
            style_hint,
            diction,
            emphasis,
        }
    }
}

use Diction::{Casual, Fast, Normal, Precise, Slow};
use Emphasis::{High, Low, Medium};

/// Trait keywords scanned in order of specificity: the elderly and
/// cultural traits first so "grumpy old grandfather" resolves to
/// grandfather rather than grumpy.
const TRAIT_ORDER: &[&str] = &[
    "karen",
    "granny",
    "grandfather",
    "veteran",
    "elder",
    "senior",
    "tribal",
    "shaman",
    "merchant",
    "master",
    "leader",
    "seafarer",
    "cultural",
    "grumpy",
    "old",
    "wise",
    "mentor",
    "surfer",
    "chill",
    "detective",
    "professional",
    "warrior",
    "commander",
    "sassy",
    "best-friend",
    "vampire",
    "dark",
    "romantic",
    "girlfriend",
    "teacher",
    "educational",
    "therapist",
    "support",
    "bard",
    "storyteller",
    "comedic",
];

fn trait_tuning(keyword: &str) -> Option<VoiceTuning> {
    let tuning = match keyword {
        "old" => VoiceTuning::new("charon", 0.95, 0.9, "wise, thoughtful, measured pace, clear enunciation", Precise, Medium),
        "wise" => VoiceTuning::new("charon", 0.95, 0.9, "calm, authoritative, thoughtful, clear", Precise, Medium),
        "mentor" => VoiceTuning::new("charon", 0.98, 0.92, "patient, encouraging, clear, warm", Precise, Medium),
        "grumpy" => VoiceTuning::new("puck", 1.1, 0.95, "dry, muttery, comedic irritation, quick", Casual, High),
        "comedic" => VoiceTuning::new("puck", 1.15, 1.0, "energetic, expressive, animated, quick", Fast, High),
        "surfer" => VoiceTuning::new("kore", 0.9, 1.0, "relaxed, friendly, beachy, upbeat, laid-back", Casual, Low),
        "chill" => VoiceTuning::new("kore", 0.9, 1.0, "laid-back, relaxed, easygoing", Casual, Low),
        "detective" => VoiceTuning::new("fenrir", 1.05, 0.95, "confident, sharp, analytical, clear", Precise, Medium),
        "professional" => VoiceTuning::new("aoede", 1.0, 1.0, "professional, clear, confident, articulate", Precise, Medium),
        "warrior" => VoiceTuning::new("fenrir", 1.1, 0.92, "commanding, strong, confident, clear", Precise, High),
        "commander" => VoiceTuning::new("fenrir", 1.12, 0.9, "authoritative, commanding, strong, clear", Precise, High),
        "sassy" => VoiceTuning::new("aoede", 1.2, 1.05, "sassy, quick-witted, expressive, animated", Fast, High),
        "best-friend" => VoiceTuning::new("kore", 1.1, 1.0, "friendly, warm, conversational, expressive", Casual, Medium),
        "vampire" => VoiceTuning::new("charon", 0.92, 0.88, "elegant, mysterious, refined, deliberate", Precise, Low),
        "dark" => VoiceTuning::new("charon", 0.95, 0.9, "mysterious, dark, refined", Precise, Low),
        "romantic" => VoiceTuning::new("pulcherrima", 0.98, 1.02, "warm, gentle, romantic, soft", Normal, Low),
        "girlfriend" => VoiceTuning::new("kore", 1.0, 1.0, "warm, caring, gentle, affectionate", Normal, Medium),
        "teacher" => VoiceTuning::new("aoede", 1.0, 1.0, "clear, patient, encouraging, articulate", Precise, Medium),
        "educational" => VoiceTuning::new("aoede", 1.0, 1.0, "clear, patient, educational, encouraging", Precise, Medium),
        "therapist" => VoiceTuning::new("kore", 0.95, 1.0, "calm, gentle, empathetic, soothing", Normal, Low),
        "support" => VoiceTuning::new("kore", 0.95, 1.0, "empathetic, gentle, calm, supportive", Normal, Low),
        "bard" => VoiceTuning::new("puck", 1.05, 1.0, "expressive, animated, storytelling, engaging", Normal, High),
        "storyteller" => VoiceTuning::new("puck", 1.05, 1.0, "expressive, engaging, animated, storytelling", Normal, High),
        "karen" => VoiceTuning::new("aoede", 1.2, 1.15, "sharp, demanding, entitled, high-pitched when agitated", Fast, High),
        "granny" => VoiceTuning::new("kore", 0.9, 0.95, "warm, gentle, caring, slightly slower pace, loving", Slow, Medium),
        "grandfather" => VoiceTuning::new("charon", 0.88, 0.9, "calm, warm, storytelling, slow deliberate pace, reassuring", Slow, Low),
        "veteran" => VoiceTuning::new("fenrir", 1.0, 0.92, "gruff, authoritative, honorable, clear, military precision", Precise, Medium),
        "elder" => VoiceTuning::new("charon", 0.92, 0.9, "wise, thoughtful, patient, clear enunciation", Precise, Medium),
        "senior" => VoiceTuning::new("kore", 0.95, 0.95, "warm, patient, clear, slightly slower pace", Normal, Medium),
        "tribal" => VoiceTuning::new("fenrir", 1.0, 0.95, "proud, traditional, strong, clear, with cultural respect", Precise, High),
        "shaman" => VoiceTuning::new("charon", 0.9, 0.88, "mystical, spiritual, connected, slow deliberate pace, wise", Precise, Low),
        "merchant" => VoiceTuning::new("puck", 1.1, 1.0, "charismatic, engaging, hospitable, expressive, storytelling", Fast, High),
        "master" => VoiceTuning::new("charon", 0.95, 0.9, "wise, disciplined, patient, clear, teaching tone", Precise, Medium),
        "leader" => VoiceTuning::new("fenrir", 1.05, 1.0, "passionate, strong, family-oriented, warm but commanding", Precise, High),
        "seafarer" => VoiceTuning::new("fenrir", 1.0, 0.95, "rough, warm, storytelling, weathered by sea, adventurous", Casual, Medium),
        "cultural" => VoiceTuning::new("kore", 1.0, 1.0, "warm, respectful, culturally aware, clear", Normal, Medium),
        _ => return None,
    };
    Some(tuning)
}

const FEMALE_ENDINGS: &[&str] = &[
    "a", "ia", "ina", "ella", "ette", "elle", "ana", "ena",
];
const MALE_ENDINGS: &[&str] = &[
    "o", "io", "us", "er", "or", "an", "en", "on", "el", "al",
];

const FEMALE_NAMES: &[&str] = &[
    "maria", "sophia", "emily", "sarah", "anna", "lisa", "jessica", "jennifer", "nicole",
    "rachel", "elizabeth", "michelle", "ashley", "amanda", "melissa", "stephanie", "rebecca",
    "laura", "sharon", "cynthia", "kathleen", "amy", "angela", "emma", "nancy", "betty",
    "helen", "sandra", "donna", "carol", "ruth", "kimberly", "martha", "christine", "marie",
    "janet", "catherine", "frances", "ann", "joyce", "diane", "alice", "julie", "heather",
    "teresa", "gloria", "evelyn", "jean", "cheryl", "katherine", "joan", "judith", "rose",
    "kelly", "judy", "christina", "kathy", "theresa", "beverly", "denise", "irene", "jane",
    "lori", "marilyn", "andrea", "louise", "sara", "anne", "jacqueline", "bonnie", "julia",
    "ruby", "tina", "paula", "diana", "annie", "lillian", "robin", "peggy", "crystal",
    "rita", "dawn", "connie", "florence", "tracy", "tiffany", "carmen", "rosa", "cindy",
    "grace", "wendy", "victoria", "edith", "kim", "sylvia", "josephine", "shannon", "sheila",
    "ellen", "elaine", "marjorie", "carrie", "charlotte", "monica", "esther", "pauline",
    "anita", "hazel", "amber", "eva", "april", "leslie", "clara", "lucille", "jamie",
    "joanne", "eleanor", "valerie", "danielle", "megan", "alicia", "suzanne", "gail",
    "lucy", "ella", "gina", "kristin", "natalie", "agnes", "vera", "pearl", "maureen",
    "colleen", "allison", "tamara", "joy", "georgia", "constance", "claudia", "jackie",
    "marcia", "tanya", "nellie", "minnie", "heidi", "glenda", "lydia", "viola", "courtney",
    "marian", "stella", "caroline", "dora", "maxine", "irma", "mabel", "lena", "deanna",
    "patsy", "hilda", "gwendolyn", "nora", "nina", "cassandra", "leah", "penny", "kay",
    "priscilla", "naomi", "carole", "olga", "leona", "jenny", "felicia", "sonia", "miriam",
    "becky", "vivian", "roberta", "holly", "brittany", "melanie", "loretta", "yolanda",
    "jeanette", "laurie", "katie", "kristen", "vanessa", "alma", "sue", "elsie", "beth",
    "jeanne", "rosemary", "linda", "karen", "susan",
];

const MALE_NAMES: &[&str] = &[
    "michael", "john", "david", "james", "robert", "william", "richard", "joseph", "thomas",
    "charles", "christopher", "daniel", "matthew", "anthony", "mark", "donald", "steven",
    "paul", "andrew", "joshua", "kenneth", "kevin", "brian", "george", "timothy", "ronald",
    "jason", "edward", "jeffrey", "ryan", "jacob", "gary", "nicholas", "eric", "jonathan",
    "stephen", "larry", "justin", "scott", "brandon", "benjamin", "frank", "gregory",
    "raymond", "alexander", "patrick", "jack", "dennis", "jerry", "tyler", "aaron", "jose",
    "henry", "adam", "douglas", "nathan", "zachary", "kyle", "noah", "ethan", "jeremy",
    "walter", "christian", "keith", "roger", "terry", "gerald", "harold", "sean", "austin",
    "carl", "arthur", "lawrence", "dylan", "jesse", "jordan", "bryan", "billy", "joe",
    "bruce", "ralph", "roy", "wayne", "eugene", "louis", "philip", "johnny", "howard",
    "alan", "juan", "willie", "russell", "harry", "albert", "randy", "carlos", "victor",
    "jimmy", "craig", "bobby", "phillip", "samuel", "fred",
];

/// Name-ending and common-name heuristic. Endings win over the name
/// lists, matching long-standing behavior.
pub fn detect_gender_from_name(name: &str) -> Gender {
    let lower = name.to_lowercase();

    if lower.len() > 3 {
        if FEMALE_ENDINGS.iter().any(|e| lower.ends_with(e)) {
            return Gender::Female;
        }
        if MALE_ENDINGS.iter().any(|e| lower.ends_with(e)) {
            return Gender::Male;
        }
    }

    if FEMALE_NAMES.iter().any(|n| lower.contains(n)) {
        return Gender::Female;
    }
    if MALE_NAMES.iter().any(|n| lower.contains(n)) {
        return Gender::Male;
    }
    Gender::Neutral
}

/// Swap a cross-gender trait voice into the matching bucket. A
/// female-named character never keeps a male-bucket voice and
/// symmetrically.
fn correct_voice_for_gender(voice_name: &'static str, gender: Gender) -> &'static str {
    match gender {
        Gender::Female => match voice_name {
            "charon" | "fenrir" | "orus" | "gacrux" => "aoede",
            "puck" => "kore",
            other => other,
        },
        Gender::Male => match voice_name {
            "aoede" | "pulcherrima" | "zephyr" => "fenrir",
            "kore" => "puck",
            other => other,
        },
        _ => voice_name,
    }
}

/// Pick a tuned voice for a character from its text fields alone.
pub fn heuristic_tuning(
    name: &str,
    archetype: &str,
    category: &str,
    tagline: Option<&str>,
    description: Option<&str>,
) -> VoiceTuning {
    let all_text = format!(
        "{} {} {} {} {}",
        name.to_lowercase(),
        archetype.to_lowercase(),
        category.to_lowercase(),
        tagline.unwrap_or("").to_lowercase(),
        description.unwrap_or("").to_lowercase(),
    );
    let gender = detect_gender_from_name(name);

    for keyword in TRAIT_ORDER {
        if all_text.contains(keyword) {
            if let Some(mut tuning) = trait_tuning(keyword) {
                tuning.voice_name = correct_voice_for_gender(tuning.voice_name, gender);
                return tuning;
            }
        }
    }

    let default_voice = match gender {
        Gender::Female => "aoede",
        Gender::Male => "fenrir",
        _ => "kore",
    };
    let category_lower = category.to_lowercase();

    if category_lower.contains("comedy") {
        return VoiceTuning::new(
            default_voice,
            1.1,
            if gender == Gender::Female { 1.05 } else { 1.0 },
            "energetic, expressive, animated",
            Fast,
            High,
        );
    }
    if category_lower.contains("adventure") || category_lower.contains("fiction") {
        return VoiceTuning::new(
            if gender == Gender::Female { "kore" } else { "fenrir" },
            1.05,
            if gender == Gender::Female { 1.0 } else { 0.95 },
            "confident, strong, clear",
            Precise,
            Medium,
        );
    }
    if category_lower.contains("romance") {
        return VoiceTuning::new(
            default_voice,
            1.0,
            if gender == Gender::Female { 1.02 } else { 1.0 },
            "warm, gentle, caring",
            Normal,
            Medium,
        );
    }

    VoiceTuning::new(
        default_voice,
        1.0,
        match gender {
            Gender::Female => 1.02,
            Gender::Male => 0.98,
            _ => 1.0,
        },
        "natural, conversational, clear",
        Normal,
        Medium,
    )
}

pub fn speed_from_diction(diction: Diction) -> f64 {
    match diction {
        Diction::Slow => 0.85,
        Diction::Casual => 0.95,
        Diction::Normal => 1.0,
        Diction::Precise => 1.05,
        Diction::Fast => 1.15,
    }
}
