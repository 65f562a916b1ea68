//! Instruction prompts sent alongside the map snapshot
//! 与地图快照一起发送的指令提示

use super::request::{Language, PromptVariant};

const EN_BRIEF: &str = "Describe this map in approximately 50 words for visually impaired users. \
Focus on: 1) The geographic region, \
2) The names of key features, \
3) Cardinal directions (north, south, east, west) of key elements. \
Be clear and structured. \
IMPORTANT: Do NOT use any formatting characters like *, -, #, or other special symbols. \
The text will be read aloud directly, so write only plain flowing text without Markdown or formatting.";

const EN_MARKERS: &str = "Describe this map in approximately 50 words for visually impaired users. \
Focus on: 1) The geographic region, \
2) The names of key features, \
3) Cardinal directions (north, south, east, west) of key elements, \
4) How densely the markers are distributed and where they form clusters. \
Be clear and structured. \
IMPORTANT: Do NOT use any formatting characters like *, -, #, or other special symbols. \
The text will be read aloud directly, so write only plain flowing text without Markdown or formatting.";

const DE_BRIEF: &str = "Beschreibe diese Karte in etwa 50 Wörtern für sehbehinderte Nutzer. \
Konzentriere dich auf: 1) Die geografische Region, \
2) Die Namen wichtiger Merkmale, \
3) Himmelsrichtungen (Norden, Süden, Osten, Westen) der wichtigsten Elemente. \
Sei klar und strukturiert. \
WICHTIG: Verwende KEINE Formatierungszeichen wie *, -, #, oder andere Sonderzeichen. \
Der Text wird direkt vorgelesen, also schreibe nur normalen Fließtext ohne Markdown oder Formatierung.";

const DE_MARKERS: &str = "Beschreibe diese Karte in etwa 50 Wörtern für sehbehinderte Nutzer. \
Konzentriere dich auf: 1) Die geografische Region, \
2) Die Namen wichtiger Merkmale, \
3) Himmelsrichtungen (Norden, Süden, Osten, Westen) der wichtigsten Elemente, \
4) Wie dicht die Markierungen verteilt sind und wo sie sich häufen. \
Sei klar und strukturiert. \
WICHTIG: Verwende KEINE Formatierungszeichen wie *, -, #, oder andere Sonderzeichen. \
Der Text wird direkt vorgelesen, also schreibe nur normalen Fließtext ohne Markdown oder Formatierung.";

/// Pick the fixed prompt for a language and variant / 按语言和变体选择固定提示
pub fn select_prompt(language: Language, variant: PromptVariant) -> &'static str {
    match (language, variant) {
        (Language::English, PromptVariant::Brief) => EN_BRIEF,
        (Language::English, PromptVariant::Markers) => EN_MARKERS,
        (Language::German, PromptVariant::Brief) => DE_BRIEF,
        (Language::German, PromptVariant::Markers) => DE_MARKERS,
    }
}
