use alloc::{string::String, vec::Vec};
use core::ops::Index;
use serde::{Deserialize, Serialize};

use crate::*;

/// Image handed out by the image backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: String,
    pub display_url: String,
}

impl ImageRecord {
    pub fn new(id: impl Into<String>, display_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_url: display_url.into(),
        }
    }
}

/// Verdict painted on a cell by an attempt.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellMark {
    #[default]
    Neutral,
    Correct,
    Incorrect,
}

/// What the player sees on a cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellVisual {
    Neutral,
    Selected,
    Correct,
    Incorrect,
}

impl CellVisual {
    pub const fn class_name(self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Selected => "selected",
            Self::Correct => "correct",
            Self::Incorrect => "incorrect",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    id: String,
    image_url: String,
    index: CellIndex,
    mark: CellMark,
    selected: bool,
}

impl Cell {
    fn new(index: CellIndex, image: ImageRecord) -> Self {
        Self {
            id: image.id,
            image_url: image.display_url,
            index,
            mark: CellMark::Neutral,
            selected: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    pub fn index(&self) -> CellIndex {
        self.index
    }

    pub fn mark(&self) -> CellMark {
        self.mark
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn visual(&self) -> CellVisual {
        match (self.mark, self.selected) {
            (CellMark::Correct, _) => CellVisual::Correct,
            (CellMark::Incorrect, _) => CellVisual::Incorrect,
            (CellMark::Neutral, true) => CellVisual::Selected,
            (CellMark::Neutral, false) => CellVisual::Neutral,
        }
    }
}

/// The nine cells of a round, in row-major order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Cell>", into = "Vec<Cell>")]
pub struct Grid {
    cells: Vec<Cell>,
}

impl Grid {
    /// Builds a grid from the first nine images; any extras are discarded.
    pub fn from_images(images: impl IntoIterator<Item = ImageRecord>) -> Result<Self> {
        let cells: Vec<Cell> = CellIndex::all()
            .zip(images)
            .map(|(index, image)| Cell::new(index, image))
            .collect();

        if cells.len() < GRID_CELLS {
            return Err(GameError::NotEnoughImages(cells.len()));
        }

        Ok(Self { cells })
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Identifiers of every cell, used as the candidate list for matching.
    pub fn ids(&self) -> Vec<String> {
        self.cells.iter().map(|cell| cell.id.clone()).collect()
    }

    pub fn position_of(&self, id: &str) -> Option<CellIndex> {
        self.cells
            .iter()
            .find(|cell| cell.id == id)
            .map(|cell| cell.index)
    }

    /// Returns every cell to neutral and unselected.
    pub fn reset(&mut self) {
        for cell in &mut self.cells {
            cell.mark = CellMark::Neutral;
            cell.selected = false;
        }
    }

    pub fn clear_selection(&mut self) {
        for cell in &mut self.cells {
            cell.selected = false;
        }
    }

    /// Selects exactly one cell.
    pub fn highlight(&mut self, index: CellIndex) {
        for cell in &mut self.cells {
            cell.selected = cell.index == index;
        }
    }

    pub(crate) fn paint(&mut self, index: CellIndex, mark: CellMark) {
        let cell = &mut self.cells[index.as_usize()];
        cell.mark = mark;
        cell.selected = true;
    }

    pub fn selected(&self) -> impl Iterator<Item = CellIndex> + '_ {
        self.cells
            .iter()
            .filter(|cell| cell.selected)
            .map(|cell| cell.index)
    }
}

impl TryFrom<Vec<Cell>> for Grid {
    type Error = GameError;

    /// Accepts exactly nine cells, each sitting at its own index.
    fn try_from(cells: Vec<Cell>) -> Result<Self> {
        if cells.len() < GRID_CELLS {
            return Err(GameError::NotEnoughImages(cells.len()));
        }
        if let Some((_, cell)) = cells
            .iter()
            .enumerate()
            .find(|(position, cell)| cell.index.as_usize() != *position)
        {
            return Err(GameError::InvalidIndex(cell.index.get()));
        }
        Ok(Self { cells })
    }
}

impl From<Grid> for Vec<Cell> {
    fn from(grid: Grid) -> Self {
        grid.cells
    }
}

impl Index<CellIndex> for Grid {
    type Output = Cell;

    fn index(&self, index: CellIndex) -> &Self::Output {
        &self.cells[index.as_usize()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;

    fn images(count: usize) -> Vec<ImageRecord> {
        (0..count)
            .map(|i| ImageRecord::new(format!("img-{i}"), format!("https://img.test/{i}.jpg")))
            .collect()
    }

    fn idx(index: u8) -> CellIndex {
        CellIndex::new(index).unwrap()
    }

    #[test]
    fn takes_first_nine_images_and_discards_extras() {
        let grid = Grid::from_images(images(12)).unwrap();

        assert_eq!(grid.cells().len(), GRID_CELLS);
        assert_eq!(grid[idx(8)].id(), "img-8");
        assert_eq!(grid.position_of("img-10"), None);
        assert_eq!(grid.position_of("img-4"), Some(idx(4)));
    }

    #[test]
    fn too_few_images_is_an_error() {
        assert_eq!(
            Grid::from_images(images(7)),
            Err(GameError::NotEnoughImages(7))
        );
    }

    #[test]
    fn deserializing_checks_the_cell_layout() {
        let mut grid = Grid::from_images(images(9)).unwrap();
        grid.paint(idx(3), CellMark::Correct);
        let json = serde_json::to_string(&grid).unwrap();
        assert_eq!(serde_json::from_str::<Grid>(&json).unwrap(), grid);

        let mut cells: Vec<Cell> = grid.clone().into();
        cells.truncate(4);
        let short = serde_json::to_string(&cells).unwrap();
        assert!(serde_json::from_str::<Grid>(&short).is_err());

        let mut cells: Vec<Cell> = grid.into();
        cells.swap(0, 1);
        assert_eq!(Grid::try_from(cells), Err(GameError::InvalidIndex(1)));
    }

    #[test]
    fn highlight_selects_a_single_cell() {
        let mut grid = Grid::from_images(images(9)).unwrap();

        grid.highlight(idx(2));
        grid.highlight(idx(5));

        let selected: Vec<_> = grid.selected().collect();
        assert_eq!(selected, [idx(5)]);
        assert_eq!(grid[idx(5)].visual(), CellVisual::Selected);
        assert_eq!(grid[idx(2)].visual(), CellVisual::Neutral);
    }

    #[test]
    fn paint_marks_and_selects_until_reset() {
        let mut grid = Grid::from_images(images(9)).unwrap();

        grid.paint(idx(0), CellMark::Incorrect);
        grid.paint(idx(1), CellMark::Correct);
        assert_eq!(grid[idx(0)].visual(), CellVisual::Incorrect);
        assert_eq!(grid[idx(1)].visual(), CellVisual::Correct);

        grid.clear_selection();
        assert!(!grid[idx(0)].is_selected());
        assert_eq!(grid[idx(0)].mark(), CellMark::Incorrect);

        grid.reset();
        assert!(grid.cells().iter().all(|cell| cell.visual() == CellVisual::Neutral));
    }
}
