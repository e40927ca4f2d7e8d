//! Hairstyle template catalog and selection state
//!
//! The catalog is static, read-only data: the engine never validates or
//! interprets the overlay payloads, it only hands the active one to the
//! renderer and, on capture, to the analysis service. Selection state is the
//! gender/length filter plus a wrap-around carousel index.

use serde::{Deserialize, Serialize};

/// Template set selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Default for Gender {
    fn default() -> Self {
        Self::Male
    }
}

/// Hair length category used to filter templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthCategory {
    Short,
    Medium,
    Long,
}

impl Default for LengthCategory {
    fn default() -> Self {
        Self::Short
    }
}

/// A hairstyle silhouette template.
///
/// `overlay_path` is SVG path data in a 320x350 viewbox, treated as an
/// opaque render payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StyleTemplate {
    pub id: &'static str,
    /// Korean display name
    pub name: &'static str,
    pub name_en: &'static str,
    pub description: &'static str,
    pub description_en: &'static str,
    pub category: LengthCategory,
    pub overlay_path: &'static str,
}

impl StyleTemplate {
    /// Display name for the requested language
    pub fn display_name(&self, language: &str) -> &'static str {
        if language == "en" {
            self.name_en
        } else {
            self.name
        }
    }

    /// Description for the requested language
    pub fn display_description(&self, language: &str) -> &'static str {
        if language == "en" {
            self.description_en
        } else {
            self.description
        }
    }
}

/// A selectable target hair color swatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HairColor {
    pub name: &'static str,
    /// Korean swatch label
    pub label: &'static str,
    pub label_en: &'static str,
    /// CSS hex value; "transparent" keeps the original color
    pub hex: &'static str,
}

pub const HAIR_COLORS: &[HairColor] = &[
    HairColor { name: "Original", label: "유지", label_en: "Orig", hex: "transparent" },
    HairColor { name: "Black", label: "블랙", label_en: "Black", hex: "#1a1a1a" },
    HairColor { name: "Dark Brown", label: "D.브라운", label_en: "D.Brwn", hex: "#4a3b32" },
    HairColor { name: "Ash Brown", label: "애쉬", label_en: "Ash", hex: "#7a7065" },
    HairColor { name: "Red Wine", label: "와인", label_en: "Wine", hex: "#5c1a1a" },
    HairColor { name: "Blonde", label: "블론드", label_en: "Blonde", hex: "#e6c885" },
    HairColor { name: "Pink", label: "핑크", label_en: "Pink", hex: "#ff9eac" },
    HairColor { name: "Grey", label: "그레이", label_en: "Grey", hex: "#9ca3af" },
    HairColor { name: "Blue", label: "블루", label_en: "Blue", hex: "#60a5fa" },
    HairColor { name: "Violet", label: "바이올렛", label_en: "Violet", hex: "#a78bfa" },
];

pub const MALE_TEMPLATES: &[StyleTemplate] = &[
    // Short
    StyleTemplate {
        id: "ivyleague",
        name: "아이비리그 컷",
        name_en: "Ivy League Cut",
        description: "짧고 스포티한 남성미",
        description_en: "Short, sporty, and masculine",
        category: LengthCategory::Short,
        overlay_path: "M100,60 L100,40 Q160,20 220,40 L220,60 Q260,100 250,180 Q240,220 200,240 Q120,240 80,220 Q70,180 60,100 Q60,60 100,60",
    },
    StyleTemplate {
        id: "pomade",
        name: "포마드",
        name_en: "Pomade / Side Part",
        description: "신뢰감을 주는 클래식한 스타일",
        description_en: "Classic style giving trust",
        category: LengthCategory::Short,
        overlay_path: "M90,60 Q150,20 230,50 Q260,80 250,160 Q240,200 200,210 Q120,210 80,190 Q70,150 60,100 Q60,60 90,60 M200,50 L190,80 M80,120 Q120,100 160,90",
    },
    StyleTemplate {
        id: "dropcut",
        name: "드롭 컷",
        name_en: "Drop Cut",
        description: "옆은 다운, 앞은 세련되게",
        description_en: "Down on sides, stylish front",
        category: LengthCategory::Short,
        overlay_path: "M90,60 Q160,20 230,60 Q260,100 250,160 Q240,200 200,220 Q120,220 80,200 Q70,160 60,100 Q60,60 90,60 M120,60 Q160,40 200,60",
    },
    StyleTemplate {
        id: "crop",
        name: "크롭 컷",
        name_en: "Crop Cut",
        description: "직선적인 앞머리의 트렌디함",
        description_en: "Trendy straight bangs",
        category: LengthCategory::Short,
        overlay_path: "M80,70 Q160,30 240,70 Q270,110 260,180 Q250,220 160,230 Q70,220 60,180 Q50,110 80,70 M90,80 L230,80",
    },
    StyleTemplate {
        id: "regent",
        name: "리젠트 컷",
        name_en: "Regent Cut",
        description: "이마를 드러낸 신뢰감 있는 스타일",
        description_en: "Forehead exposed, trustworthy look",
        category: LengthCategory::Short,
        overlay_path: "M100,50 Q160,10 220,50 Q250,100 240,180 Q230,220 160,230 Q90,220 80,180 Q70,100 100,50 M120,50 L140,30 M160,30 L180,50",
    },
    // Medium
    StyleTemplate {
        id: "dandy",
        name: "내추럴 댄디",
        name_en: "Natural Dandy",
        description: "실패 없는 국민 남성 스타일",
        description_en: "Classic, fail-proof style",
        category: LengthCategory::Medium,
        overlay_path: "M90,70 Q160,10 230,70 Q270,120 260,200 Q250,250 200,270 Q160,280 120,270 Q70,250 60,200 Q50,120 90,70",
    },
    StyleTemplate {
        id: "seethrough",
        name: "시스루 댄디",
        name_en: "See-through Dandy",
        description: "가볍고 부드러운 앞머리",
        description_en: "Light and soft bangs",
        category: LengthCategory::Medium,
        overlay_path: "M90,70 Q160,10 230,70 Q270,120 260,200 Q250,250 200,270 Q160,280 120,270 Q70,250 60,200 Q50,120 90,70 M130,70 L130,120 M160,70 L160,120 M190,70 L190,120",
    },
    StyleTemplate {
        id: "parted",
        name: "가르마/애즈",
        name_en: "Parted / Adze",
        description: "부드러운 감성 스타일",
        description_en: "Soft, emotional vibe",
        category: LengthCategory::Medium,
        overlay_path: "M90,90 Q120,30 160,80 Q200,30 230,90 Q270,150 260,220 Q250,260 160,260 Q70,260 60,220 Q50,150 90,90",
    },
    StyleTemplate {
        id: "guile",
        name: "가일 컷",
        name_en: "Guile Cut",
        description: "한쪽은 내리고 한쪽은 포마드",
        description_en: "Half down, half pomade",
        category: LengthCategory::Medium,
        overlay_path: "M100,70 Q130,100 160,60 Q200,20 230,60 Q260,120 260,200 Q250,250 200,270 Q160,280 120,270 Q70,250 60,200 Q60,120 100,70 M160,60 Q160,120 140,150",
    },
    StyleTemplate {
        id: "shadow",
        name: "쉐도우 펌",
        name_en: "Shadow Perm",
        description: "S컬의 볼륨감 있는 웨이브",
        description_en: "Voluminous S-curl wave",
        category: LengthCategory::Medium,
        overlay_path: "M80,80 Q120,40 160,80 Q200,40 240,80 Q280,140 270,220 Q260,260 160,270 Q60,260 50,220 Q40,140 80,80 M100,80 Q120,120 140,80 M180,80 Q200,120 220,80",
    },
    // Long
    StyleTemplate {
        id: "leaf",
        name: "리프 컷",
        name_en: "Leaf Cut",
        description: "나뭇잎처럼 흐르는 긴 기장",
        description_en: "Flowing long length like a leaf",
        category: LengthCategory::Long,
        overlay_path: "M80,80 Q160,20 240,80 Q290,150 280,250 Q240,300 160,300 Q80,300 40,250 Q30,150 80,80 M80,80 Q60,180 40,220 M240,80 Q260,180 280,220",
    },
    StyleTemplate {
        id: "wolf",
        name: "울프 컷",
        name_en: "Wolf Cut",
        description: "거칠고 힙한 텍스처",
        description_en: "Rough and hip texture",
        category: LengthCategory::Long,
        overlay_path: "M90,60 Q160,20 230,60 Q260,100 250,180 Q280,240 280,300 L260,320 Q240,280 220,240 Q100,240 80,280 L60,320 Q40,280 40,240 Q60,180 70,100 Q60,60 90,60",
    },
];

pub const FEMALE_TEMPLATES: &[StyleTemplate] = &[
    // Short
    StyleTemplate {
        id: "bob",
        name: "태슬/단발",
        name_en: "Tassel / Bob",
        description: "시크하고 도도한 칼단발",
        description_en: "Chic and sharp bob",
        category: LengthCategory::Short,
        overlay_path: "M90,60 Q160,10 230,60 Q260,80 260,250 L260,280 Q160,290 60,280 L60,250 Q60,80 90,60",
    },
    StyleTemplate {
        id: "ruffle",
        name: "러플 펌",
        name_en: "Ruffle Perm",
        description: "자유분방한 컬의 숏 스타일",
        description_en: "Free-spirited curly short style",
        category: LengthCategory::Short,
        overlay_path: "M80,70 Q160,20 240,70 Q280,100 270,220 Q290,260 260,280 Q160,290 60,280 Q30,260 50,220 Q40,100 80,70 M80,120 Q100,160 120,120 M200,120 Q220,160 240,120",
    },
    StyleTemplate {
        id: "shortcut",
        name: "숏 컷",
        name_en: "Pixie / Short",
        description: "도시적이고 세련된 무드",
        description_en: "Urban and sophisticated",
        category: LengthCategory::Short,
        overlay_path: "M100,60 Q160,20 220,60 Q250,100 240,180 Q230,220 200,240 Q120,240 90,220 Q80,180 70,100 Q70,60 100,60 M80,180 L70,220",
    },
    StyleTemplate {
        id: "bonnie",
        name: "보니 펌",
        name_en: "Bonnie Perm",
        description: "귀엽고 사랑스러운 C컬 단발",
        description_en: "Cute and lovely C-curl",
        category: LengthCategory::Short,
        overlay_path: "M80,70 Q160,10 240,70 Q280,120 270,220 Q290,260 260,280 Q160,290 60,280 Q30,260 50,220 Q40,120 80,70",
    },
    // Medium
    StyleTemplate {
        id: "medium_c",
        name: "중단발 C컬",
        name_en: "Medium C-Curl",
        description: "단정하고 우아한 오피스 룩",
        description_en: "Neat and elegant office look",
        category: LengthCategory::Medium,
        overlay_path: "M100,60 Q160,10 220,60 Q260,100 260,240 Q260,280 230,270 Q160,280 90,270 Q60,280 60,240 Q60,100 100,60",
    },
    StyleTemplate {
        id: "build",
        name: "빌드/S컬",
        name_en: "Build / S-Curl",
        description: "여성스럽고 우아한 웨이브",
        description_en: "Feminine and elegant wave",
        category: LengthCategory::Medium,
        overlay_path: "M100,60 Q160,10 220,60 Q270,120 280,200 Q300,280 280,340 Q160,360 40,340 Q20,280 40,200 Q50,120 100,60 M40,180 Q20,250 30,320 M280,180 Q300,250 290,320",
    },
    StyleTemplate {
        id: "hush",
        name: "허쉬/레이어드",
        name_en: "Hush / Layered",
        description: "가볍고 층이 많은 스타일",
        description_en: "Light and layered style",
        category: LengthCategory::Medium,
        overlay_path: "M100,60 Q160,10 220,60 Q270,120 280,200 Q290,280 250,320 Q160,340 70,320 Q30,280 40,200 Q50,120 100,60 M40,200 Q30,250 20,300 M280,200 Q290,250 300,300",
    },
    StyleTemplate {
        id: "wind",
        name: "윈드 컷",
        name_en: "Wind Cut",
        description: "바람에 날린 듯 자연스러운",
        description_en: "Natural, wind-blown look",
        category: LengthCategory::Medium,
        overlay_path: "M90,60 Q160,20 230,60 Q260,100 250,200 Q270,250 260,300 Q160,320 60,300 Q50,250 70,200 Q60,100 90,60",
    },
    // Long
    StyleTemplate {
        id: "grace",
        name: "그레이스 펌",
        name_en: "Grace Perm",
        description: "풍성하고 고급스러운 여신 웨이브",
        description_en: "Voluminous and luxurious waves",
        category: LengthCategory::Long,
        overlay_path: "M90,50 Q160,10 230,50 Q280,100 300,200 Q320,300 280,420 Q160,440 40,420 Q0,300 20,200 Q40,100 90,50 M20,250 Q0,300 30,350 M300,250 Q320,300 290,350",
    },
    StyleTemplate {
        id: "hippie",
        name: "히피 펌",
        name_en: "Hippie Perm",
        description: "자유분방한 컬이 매력적인",
        description_en: "Free-spirited, charming curls",
        category: LengthCategory::Long,
        overlay_path: "M80,70 Q100,50 120,70 Q140,50 160,70 Q180,50 200,70 Q220,50 240,70 Q280,150 290,250 Q280,320 160,330 Q40,320 30,250 Q40,150 80,70",
    },
    StyleTemplate {
        id: "elisabeth",
        name: "엘리자벳 펌",
        name_en: "Elizabeth Perm",
        description: "굵고 화려한 여신 머리",
        description_en: "Bold and glamorous goddess hair",
        category: LengthCategory::Long,
        overlay_path: "M90,50 Q160,10 230,50 Q280,100 290,200 Q310,300 280,380 Q160,400 40,380 Q10,300 30,200 Q40,100 90,50 M30,250 Q10,300 40,350 M290,250 Q310,300 280,350",
    },
    StyleTemplate {
        id: "sleek",
        name: "슬릭 컷",
        name_en: "Sleek Cut",
        description: "가볍게 떨어지는 생머리",
        description_en: "Lightly falling straight hair",
        category: LengthCategory::Long,
        overlay_path: "M100,50 Q160,20 220,50 Q260,80 260,250 L260,400 Q160,410 60,400 L60,250 Q60,80 100,50",
    },
];

/// All templates for one gender
pub fn templates_for(gender: Gender) -> &'static [StyleTemplate] {
    match gender {
        Gender::Male => MALE_TEMPLATES,
        Gender::Female => FEMALE_TEMPLATES,
    }
}

/// Current template selection: gender and length filter plus the carousel
/// index into the filtered list, and the chosen target color. Changing
/// either filter resets the index.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StyleSelection {
    pub gender: Gender,
    pub length: LengthCategory,
    index: usize,
    /// Selected target hair color name; `None` keeps the original color
    target_color: Option<String>,
}

impl StyleSelection {
    /// Templates matching the active filter
    pub fn active_templates(&self) -> Vec<&'static StyleTemplate> {
        templates_for(self.gender)
            .iter()
            .filter(|t| t.category == self.length)
            .collect()
    }

    /// The selected template, if the filtered list is non-empty.
    /// A stale out-of-range index falls back to the first entry.
    pub fn current(&self) -> Option<&'static StyleTemplate> {
        let active = self.active_templates();
        active.get(self.index).or_else(|| active.first()).copied()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn set_gender(&mut self, gender: Gender) {
        if self.gender != gender {
            self.gender = gender;
            self.index = 0;
        }
    }

    pub fn set_length(&mut self, length: LengthCategory) {
        if self.length != length {
            self.length = length;
            self.index = 0;
        }
    }

    /// Advance the carousel, wrapping past the end
    pub fn next(&mut self) {
        let count = self.active_templates().len();
        if count == 0 {
            self.index = 0;
            return;
        }
        self.index = (self.index + 1) % count;
    }

    /// Step the carousel back, wrapping past the start
    pub fn prev(&mut self) {
        let count = self.active_templates().len();
        if count == 0 {
            self.index = 0;
            return;
        }
        self.index = if self.index == 0 {
            count - 1
        } else {
            self.index - 1
        };
    }

    /// Choose a target hair color; "Original" clears the choice.
    pub fn set_target_color(&mut self, color: Option<String>) {
        self.target_color = color.filter(|c| c != "Original");
    }

    pub fn target_color(&self) -> Option<&str> {
        self.target_color.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_shape() {
        assert_eq!(MALE_TEMPLATES.len(), 12);
        assert_eq!(FEMALE_TEMPLATES.len(), 12);
        assert_eq!(HAIR_COLORS.len(), 10);

        let male_short = MALE_TEMPLATES
            .iter()
            .filter(|t| t.category == LengthCategory::Short)
            .count();
        assert_eq!(male_short, 5);
    }

    #[test]
    fn test_default_selection() {
        let sel = StyleSelection::default();
        assert_eq!(sel.gender, Gender::Male);
        assert_eq!(sel.length, LengthCategory::Short);
        assert_eq!(sel.current().unwrap().id, "ivyleague");
    }

    #[test]
    fn test_carousel_wraps() {
        let mut sel = StyleSelection::default();
        let count = sel.active_templates().len();

        sel.prev();
        assert_eq!(sel.index(), count - 1);
        sel.next();
        assert_eq!(sel.index(), 0);
    }

    #[test]
    fn test_filter_change_resets_index() {
        let mut sel = StyleSelection::default();
        sel.next();
        sel.next();
        assert_eq!(sel.index(), 2);

        sel.set_length(LengthCategory::Long);
        assert_eq!(sel.index(), 0);
        assert_eq!(sel.current().unwrap().id, "leaf");

        sel.next();
        sel.set_gender(Gender::Female);
        assert_eq!(sel.index(), 0);
        assert_eq!(sel.current().unwrap().id, "grace");
    }

    #[test]
    fn test_same_filter_keeps_index() {
        let mut sel = StyleSelection::default();
        sel.next();
        sel.set_gender(Gender::Male);
        assert_eq!(sel.index(), 1);
    }

    #[test]
    fn test_display_language() {
        let template = &MALE_TEMPLATES[0];
        assert_eq!(template.display_name("en"), "Ivy League Cut");
        assert_eq!(template.display_name("ko"), "아이비리그 컷");
    }
}
