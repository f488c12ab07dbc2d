use crate::model::{LotRegion, Point, RegionPayload};

use super::geometry::point_in_polygon;

/// In-memory lot regions, in the order the backend listed them followed by
/// regions drawn this session.
#[derive(Clone, Debug, Default)]
pub(super) struct RegionStore {
    regions: Vec<LotRegion>,
}

impl RegionStore {
    /// Replaces the collection wholesale with a fresh listing.
    pub fn load(&mut self, regions: Vec<LotRegion>) {
        self.regions = regions;
    }

    pub fn regions(&self) -> &[LotRegion] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn get(&self, index: usize) -> Option<&LotRegion> {
        self.regions.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut LotRegion> {
        self.regions.get_mut(index)
    }

    /// First region in store order containing `image_point`. Earlier regions
    /// shadow later ones where they overlap.
    pub fn find_at(&self, image_point: Point) -> Option<usize> {
        self.regions
            .iter()
            .position(|r| point_in_polygon(image_point, &r.coordinates))
    }

    pub fn index_of(&self, lot_number: &str) -> Option<usize> {
        self.regions.iter().position(|r| r.lot_number == lot_number)
    }

    /// Optimistic append; drawing is local until the region is saved.
    pub fn add(&mut self, region: LotRegion) -> usize {
        self.regions.push(region);
        self.regions.len() - 1
    }

    pub fn replace(&mut self, index: usize, region: LotRegion) -> bool {
        match self.regions.get_mut(index) {
            Some(slot) => {
                *slot = region;
                true
            }
            None => false,
        }
    }

    /// Full payload to send for the region at `index`. The in-memory entry is
    /// the caller's to keep current; nothing is refetched after the save.
    pub fn upsert(&self, index: usize) -> Option<RegionPayload> {
        self.regions.get(index).map(RegionPayload::from)
    }
}
