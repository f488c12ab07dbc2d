use eframe::egui;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn from_pos2(p: egui::Pos2) -> Self {
        Self { x: p.x, y: p.y }
    }

    pub fn to_pos2(self) -> egui::Pos2 {
        egui::pos2(self.x, self.y)
    }
}

/// Native pixel dimensions of the background image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImageSize {
    pub width: f32,
    pub height: f32,
}

impl ImageSize {
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    pub fn aspect(self) -> f32 {
        self.width / self.height
    }
}

/// Shape tag of a region. Only polygons are drawn; any other tag is kept
/// verbatim so saving the row writes it back unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum RegionType {
    #[default]
    Polygon,
    Other(String),
}

impl RegionType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "" | "polygon" => RegionType::Polygon,
            _ => RegionType::Other(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RegionType::Polygon => "polygon",
            RegionType::Other(raw) => raw,
        }
    }
}

impl Serialize for RegionType {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RegionType {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        Ok(RegionType::parse(&String::deserialize(d)?))
    }
}

/// A surveyed lot boundary as the backend lists it.
///
/// Coordinates are in image space. Rows come out of a spreadsheet, so every
/// field is decoded leniently.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LotRegion {
    #[serde(rename = "Lot_Number", deserialize_with = "lenient_string")]
    pub lot_number: String,
    #[serde(rename = "Owner_Name", default, deserialize_with = "lenient_opt_string")]
    pub owner_name: Option<String>,
    #[serde(rename = "Region_Type", default, deserialize_with = "lenient_region_type")]
    pub region_type: RegionType,
    #[serde(rename = "Coordinates", default, deserialize_with = "lenient_points")]
    pub coordinates: Vec<Point>,
    #[serde(rename = "Label_X", default, deserialize_with = "lenient_opt_f32")]
    pub label_x: Option<f32>,
    #[serde(rename = "Label_Y", default, deserialize_with = "lenient_opt_f32")]
    pub label_y: Option<f32>,
}

impl LotRegion {
    pub fn polygon(lot_number: String, coordinates: Vec<Point>, label: Point) -> Self {
        Self {
            lot_number,
            owner_name: None,
            region_type: RegionType::Polygon,
            coordinates,
            label_x: Some(label.x),
            label_y: Some(label.y),
        }
    }

    pub fn label_anchor(&self) -> Option<Point> {
        Some(Point::new(self.label_x?, self.label_y?))
    }

    pub fn owner(&self) -> &str {
        self.owner_name.as_deref().unwrap_or("")
    }
}

/// Body of `POST /api/lot-map/regions`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RegionPayload {
    pub lot_number: String,
    pub owner_name: String,
    pub region_type: RegionType,
    pub coordinates: Vec<Point>,
    pub label_x: f32,
    pub label_y: f32,
}

impl From<&LotRegion> for RegionPayload {
    fn from(region: &LotRegion) -> Self {
        Self {
            lot_number: region.lot_number.clone(),
            owner_name: region.owner().to_string(),
            region_type: region.region_type.clone(),
            coordinates: region.coordinates.clone(),
            label_x: region.label_x.unwrap_or(0.0),
            label_y: region.label_y.unwrap_or(0.0),
        }
    }
}

/// Success/failure envelope returned by mutating endpoints.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct SaveResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Scalar::Text(s) => s,
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            Scalar::Float(f) => f.to_string(),
            Scalar::Bool(b) => b.to_string(),
        }
    }

    fn into_f32(self) -> Option<f32> {
        match self {
            Scalar::Text(s) => s.trim().parse::<f32>().ok(),
            Scalar::Int(i) => Some(i as f32),
            Scalar::Float(f) => Some(f as f32),
            Scalar::Bool(_) => None,
        }
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<Scalar>::deserialize(d)?
        .map(Scalar::into_text)
        .unwrap_or_default())
}

fn lenient_opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Scalar>::deserialize(d)?
        .map(Scalar::into_text)
        .filter(|s| !s.is_empty()))
}

fn lenient_opt_f32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f32>, D::Error> {
    Ok(Option::<Scalar>::deserialize(d)?.and_then(Scalar::into_f32))
}

fn lenient_region_type<'de, D: Deserializer<'de>>(d: D) -> Result<RegionType, D::Error> {
    Ok(Option::<Scalar>::deserialize(d)?
        .map(|raw| RegionType::parse(&raw.into_text()))
        .unwrap_or_default())
}

fn lenient_points<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Point>, D::Error> {
    // The backend falls back to a JSON string when it could not re-parse a cell.
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Points(Vec<Point>),
        Encoded(String),
        Other(serde_json::Value),
    }
    Ok(match Option::<Raw>::deserialize(d)? {
        Some(Raw::Points(points)) => points,
        Some(Raw::Encoded(s)) => serde_json::from_str(&s).unwrap_or_default(),
        Some(Raw::Other(_)) | None => Vec::new(),
    })
}
