//! Overview strip of colored marks, one per registered region.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorTag {
    Red,
    Green,
    Blue,
    Purple,
}

impl ColorTag {
    pub fn css_class(&self) -> &'static str {
        match self {
            ColorTag::Red => "mark-red",
            ColorTag::Green => "mark-green",
            ColorTag::Blue => "mark-blue",
            ColorTag::Purple => "mark-purple",
        }
    }
}

/// What a region covers: a whole row or one of its code cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "row", rename_all = "camelCase")]
pub enum RegionOwner {
    Row(usize),
    LeftCell(usize),
    RightCell(usize),
}

impl RegionOwner {
    pub fn row(&self) -> usize {
        match self {
            RegionOwner::Row(row) | RegionOwner::LeftCell(row) | RegionOwner::RightCell(row) => {
                *row
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Region {
    pub owner: RegionOwner,
    pub color: ColorTag,
}

impl Region {
    pub fn new(owner: RegionOwner, color: ColorTag) -> Self {
        Self { owner, color }
    }
}

/// Receives the regions rows publish when they are built.
pub trait RegionRegistry {
    fn register(&mut self, region: Region);
}

impl RegionRegistry for Vec<Region> {
    fn register(&mut self, region: Region) {
        self.push(region);
    }
}

#[derive(Debug, Clone, Default)]
pub struct MiniMap {
    regions: Vec<Region>,
}

impl MiniMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Regions in registration order.
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn clear(&mut self) {
        self.regions.clear();
    }

    /// Render the strip for a table of `rows` rows.
    pub fn to_html(&self, rows: usize) -> String {
        let mut html = String::from("<div class=\"minimap\" aria-hidden=\"true\">");
        if rows > 0 {
            let height = 100.0 / rows as f64;
            for region in &self.regions {
                let row = region.owner.row();
                let top = row as f64 * height;
                html.push_str(&format!(
                    "<div class=\"mark {}\" data-row=\"{row}\" style=\"top: {top:.3}%; height: {height:.3}%\"></div>",
                    region.color.css_class()
                ));
            }
        }
        html.push_str("</div>");
        html
    }
}

impl RegionRegistry for MiniMap {
    fn register(&mut self, region: Region) {
        self.regions.push(region);
    }
}
