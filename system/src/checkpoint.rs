/// Latest serialized raster of a room's canvas. Writes replace it wholesale.
#[derive(Debug, Default)]
pub struct Checkpoint {
    snapshot: Option<String>,
}

impl Checkpoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save(&mut self, snapshot: String) {
        self.snapshot = Some(snapshot);
    }

    pub fn load(&self) -> Option<&str> {
        self.snapshot.as_deref()
    }

    pub fn invalidate(&mut self) {
        self.snapshot = None;
    }

    pub fn is_present(&self) -> bool {
        self.snapshot.is_some()
    }
}
