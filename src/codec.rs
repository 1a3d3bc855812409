//! The 12-position attribute code carried in sample image filenames.
//!
//! Every sample photo is named `<sequence>-<code>.jpg`, where `code` is twelve
//! letters, one per [`Field`] in table order:
//!
//! ```text
//! 0001-eaabbgcbbegd.jpg
//!      │││││││││││└─ style       d → 极简
//!      ││││││││││└── scene       g → 自然
//!      │││││││││└─── season      e → 四季通用
//!      ││││││││└──── color       b → 白色
//!      │││││││└───── hair        b → 短发
//!      ││││││└────── clothing    c → 长裤
//!      │││││└─────── emotion     g → 知性
//!      ││││└──────── action      b → 行走
//!      │││└───────── pose        b → 坐姿
//!      ││└────────── angle       a → 平视
//!      │└─────────── composition a → 中心构图
//!      └──────────── shot_size   e → 远景
//! ```
//!
//! ## Lenient decoding
//!
//! A letter with no entry in its field's subtable decodes to the
//! [`UNKNOWN_LABEL`] sentinel but keeps its letter, so partially specified or
//! future-extended codes still make it into the manifest and
//! [`Encoding::full_code`] always reproduces the input. Only the filename
//! *shape* can fail to parse (see [`ParseError`]).

use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Number of positions in a code (one per [`Field`]).
pub const CODE_LEN: usize = 12;

/// Letter reserved for "unknown" in every field.
pub const UNKNOWN_CODE: char = 'z';

/// Label used for `z` and for any letter missing from a field's subtable.
pub const UNKNOWN_LABEL: &str = "未知";

/// Extension of encoded sample images (matched ASCII case-insensitively).
pub const IMAGE_EXTENSION: &str = "jpg";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected a .jpg file")]
    Extension,
    #[error("expected <sequence>-<code>, found {0} dash-separated segment(s)")]
    SegmentCount(usize),
    #[error("sequence {0:?} is not a number")]
    Sequence(String),
    #[error("code must be 12 characters, found {0}")]
    CodeLength(usize),
}

/// One attribute position in the code. Declaration order is table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    ShotSize,
    Composition,
    Angle,
    Pose,
    Action,
    Emotion,
    Clothing,
    Hair,
    Color,
    Season,
    Scene,
    Style,
}

const SHOT_SIZE: &[(char, &str)] = &[
    ('a', "特写"),
    ('b', "近景"),
    ('c', "中景"),
    ('d', "全景"),
    ('e', "远景"),
    ('f', "大远景"),
    ('z', UNKNOWN_LABEL),
];

const COMPOSITION: &[(char, &str)] = &[
    ('a', "中心构图"),
    ('b', "三分法"),
    ('c', "对称构图"),
    ('d', "对角线"),
    ('e', "框架构图"),
    ('f', "留白"),
    ('g', "黄金分割"),
    ('h', "引导线"),
    ('z', UNKNOWN_LABEL),
];

const ANGLE: &[(char, &str)] = &[
    ('a', "平视"),
    ('b', "俯拍"),
    ('c', "仰拍"),
    ('d', "侧拍"),
    ('e', "45度角"),
    ('f', "正脸"),
    ('g', "侧脸"),
    ('h', "背影"),
    ('i', "低角度"),
    ('j', "高角度"),
    ('z', UNKNOWN_LABEL),
];

const POSE: &[(char, &str)] = &[
    ('a', "站姿"),
    ('b', "坐姿"),
    ('c', "蹲姿"),
    ('d', "卧姿"),
    ('e', "跪姿"),
    ('z', UNKNOWN_LABEL),
];

const ACTION: &[(char, &str)] = &[
    ('a', "静态"),
    ('b', "行走"),
    ('c', "跳跃"),
    ('d', "旋转"),
    ('e', "倚靠"),
    ('f', "抬手"),
    ('g', "抚脸"),
    ('h', "撩发"),
    ('i', "叉腰"),
    ('j', "抱臂"),
    ('k', "踢腿"),
    ('l', "弯腰"),
    ('m', "伸展"),
    ('n', "互动"),
    ('z', UNKNOWN_LABEL),
];

const EMOTION: &[(char, &str)] = &[
    ('a', "开心"),
    ('b', "忧郁"),
    ('c', "自信"),
    ('d', "温柔"),
    ('e', "酷飒"),
    ('f', "性感"),
    ('g', "知性"),
    ('h', "呆萌"),
    ('i', "严肃"),
    ('j', "神秘"),
    ('k', "慵懒"),
    ('l', "活泼"),
    ('m', "优雅"),
    ('n', "叛逆"),
    ('z', UNKNOWN_LABEL),
];

const CLOTHING: &[(char, &str)] = &[
    ('a', "长袖"),
    ('b', "短袖"),
    ('c', "长裤"),
    ('d', "短裤"),
    ('e', "长裙"),
    ('f', "短裙"),
    ('g', "连衣裙"),
    ('h', "外套"),
    ('i', "背心"),
    ('j', "西装"),
    ('k', "运动装"),
    ('l', "休闲装"),
    ('z', UNKNOWN_LABEL),
];

const HAIR: &[(char, &str)] = &[
    ('a', "长发"),
    ('b', "短发"),
    ('c', "盘发"),
    ('d', "马尾"),
    ('e', "卷发"),
    ('f', "直发"),
    ('g', "编发"),
    ('h', "帽子"),
    ('z', UNKNOWN_LABEL),
];

const COLOR: &[(char, &str)] = &[
    ('a', "黑色"),
    ('b', "白色"),
    ('c', "灰色"),
    ('d', "红色"),
    ('e', "蓝色"),
    ('f', "绿色"),
    ('g', "黄色"),
    ('h', "粉色"),
    ('i', "紫色"),
    ('j', "棕色"),
    ('k', "橙色"),
    ('l', "多彩/印花"),
    ('m', "米色"),
    ('n', "藏青"),
    ('z', UNKNOWN_LABEL),
];

const SEASON: &[(char, &str)] = &[
    ('a', "春季"),
    ('b', "夏季"),
    ('c', "秋季"),
    ('d', "冬季"),
    ('e', "四季通用"),
    ('z', UNKNOWN_LABEL),
];

const SCENE: &[(char, &str)] = &[
    ('a', "室内纯色"),
    ('b', "室内布景"),
    ('c', "街道"),
    ('d', "公园"),
    ('e', "海边"),
    ('f', "建筑"),
    ('g', "自然"),
    ('h', "工作室"),
    ('i', "咖啡厅"),
    ('j', "书店"),
    ('k', "居家"),
    ('l', "办公室"),
    ('z', UNKNOWN_LABEL),
];

const STYLE: &[(char, &str)] = &[
    ('a', "前卫"),
    ('b', "运动休闲"),
    ('c', "复古"),
    ('d', "极简"),
    ('e', "波西米亚"),
    ('f', "商务"),
    ('g', "民族"),
    ('h', "哥特"),
    ('i', "朋克"),
    ('j', "街头"),
    ('k', "学院"),
    ('l', "浪漫"),
    ('m', "优雅"),
    ('n', "甜美"),
    ('o', "日系"),
    ('p', "韩系"),
    ('z', UNKNOWN_LABEL),
];

impl Field {
    /// All fields in code position order.
    pub const ALL: [Field; CODE_LEN] = [
        Field::ShotSize,
        Field::Composition,
        Field::Angle,
        Field::Pose,
        Field::Action,
        Field::Emotion,
        Field::Clothing,
        Field::Hair,
        Field::Color,
        Field::Season,
        Field::Scene,
        Field::Style,
    ];

    /// JSON key used in the manifest (`shot_size`, `composition`, ...).
    pub fn key(self) -> &'static str {
        match self {
            Field::ShotSize => "shot_size",
            Field::Composition => "composition",
            Field::Angle => "angle",
            Field::Pose => "pose",
            Field::Action => "action",
            Field::Emotion => "emotion",
            Field::Clothing => "clothing",
            Field::Hair => "hair",
            Field::Color => "color",
            Field::Season => "season",
            Field::Scene => "scene",
            Field::Style => "style",
        }
    }

    /// Zero-based position of this field in the code.
    pub fn position(self) -> usize {
        self as usize
    }

    /// The letter → label subtable, alphabetical with `z` last.
    pub fn categories(self) -> &'static [(char, &'static str)] {
        match self {
            Field::ShotSize => SHOT_SIZE,
            Field::Composition => COMPOSITION,
            Field::Angle => ANGLE,
            Field::Pose => POSE,
            Field::Action => ACTION,
            Field::Emotion => EMOTION,
            Field::Clothing => CLOTHING,
            Field::Hair => HAIR,
            Field::Color => COLOR,
            Field::Season => SEASON,
            Field::Scene => SCENE,
            Field::Style => STYLE,
        }
    }

    /// Label for `code`, or `None` if the letter isn't in this field's subtable.
    pub fn label(self, code: char) -> Option<&'static str> {
        self.categories()
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, label)| *label)
    }

    /// Label for `code`, falling back to [`UNKNOWN_LABEL`].
    pub fn resolve(self, code: char) -> &'static str {
        self.label(code).unwrap_or(UNKNOWN_LABEL)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Snapshot of the full table as written to `encoding_definitions`.
///
/// `BTreeMap` ordering gives table order for fields (enum declaration order)
/// and alphabetical order for letters, which is also the order they are
/// declared in.
pub type EncodingDefinitions = BTreeMap<Field, BTreeMap<String, String>>;

/// Build the [`EncodingDefinitions`] snapshot from the static table.
pub fn encoding_definitions() -> EncodingDefinitions {
    Field::ALL
        .iter()
        .map(|field| {
            let entries = field
                .categories()
                .iter()
                .map(|(code, label)| (code.to_string(), label.to_string()))
                .collect();
            (*field, entries)
        })
        .collect()
}

/// One decoded position: the letter as found in the filename plus its label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCode {
    pub code: char,
    pub name: String,
}

/// A fully decoded code: exactly one [`FieldCode`] per [`Field`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "BTreeMap<Field, FieldCode>")]
pub struct Encoding {
    fields: BTreeMap<Field, FieldCode>,
}

impl Encoding {
    pub fn get(&self, field: Field) -> Option<&FieldCode> {
        self.fields.get(&field)
    }

    /// Iterate positions in table order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, &FieldCode)> {
        self.fields.iter().map(|(field, code)| (*field, code))
    }

    /// Re-concatenate the letters in table order.
    ///
    /// For an encoding produced by [`decode`] this is always the input code.
    pub fn full_code(&self) -> String {
        self.fields.values().map(|fc| fc.code).collect()
    }
}

impl Serialize for Encoding {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

impl TryFrom<BTreeMap<Field, FieldCode>> for Encoding {
    type Error = String;

    fn try_from(fields: BTreeMap<Field, FieldCode>) -> Result<Self, Self::Error> {
        // Keys are unique Field variants, so a full count means every field is present.
        if fields.len() != CODE_LEN {
            return Err(format!(
                "encoding must define all {CODE_LEN} fields, found {}",
                fields.len()
            ));
        }
        Ok(Self { fields })
    }
}

/// Decode a 12-character code.
///
/// Only the length is checked; letters outside a field's subtable resolve to
/// [`UNKNOWN_LABEL`].
pub fn decode(code: &str) -> Result<Encoding, ParseError> {
    let len = code.chars().count();
    if len != CODE_LEN {
        return Err(ParseError::CodeLength(len));
    }
    let fields = Field::ALL
        .iter()
        .zip(code.chars())
        .map(|(field, letter)| {
            (
                *field,
                FieldCode {
                    code: letter,
                    name: field.resolve(letter).to_string(),
                },
            )
        })
        .collect();
    Ok(Encoding { fields })
}

/// A filename that matched the `<sequence>-<code>.jpg` shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedName {
    /// Digits before the dash, leading zeros preserved.
    pub sequence: String,
    /// The raw 12-character code.
    pub code: String,
    pub encoding: Encoding,
}

/// Parse an encoded image filename.
///
/// - `"0001-eaabbgcbbegd.jpg"` → sequence `"0001"`, code `"eaabbgcbbegd"`
/// - `"0001-eaabbgcbbegd.JPG"` → [`ParseError::Extension`] (lowercase `.jpg` only)
/// - `"0001-eaab.jpg"` → [`ParseError::CodeLength`]
/// - `"0001-ab-cdefghijkl.jpg"` → [`ParseError::SegmentCount`]
/// - `"cover-eaabbgcbbegd.jpg"` → [`ParseError::Sequence`]
/// - `"0001-eaabbgcbbegd.png"` → [`ParseError::Extension`]
pub fn parse_encoded_filename(filename: &str) -> Result<EncodedName, ParseError> {
    let (stem, ext) = filename.rsplit_once('.').ok_or(ParseError::Extension)?;
    if ext != IMAGE_EXTENSION {
        return Err(ParseError::Extension);
    }

    let parts: Vec<&str> = stem.split('-').collect();
    let [sequence, code] = parts.as_slice() else {
        return Err(ParseError::SegmentCount(parts.len()));
    };

    if sequence.is_empty() || !sequence.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::Sequence(sequence.to_string()));
    }

    let encoding = decode(code)?;
    Ok(EncodedName {
        sequence: sequence.to_string(),
        code: code.to_string(),
        encoding,
    })
}
