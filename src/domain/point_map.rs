/// Aligns a distance/duration matrix's row/column indices to the entities
/// they represent. Index 0 is always the facility; indices 1..N are the
/// candidate employees, in the order they were passed to the matrix call.
#[derive(Debug, Clone)]
pub enum PointRef {
    Facility,
    Employee { emp_code: String },
}

#[derive(Debug, Clone, Default)]
pub struct PointMap {
    points: Vec<PointRef>,
}

impl PointMap {
    pub fn new(points: Vec<PointRef>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PointRef> {
        self.points.get(index)
    }

    /// Index of the employee with the given code, if present (never 0,
    /// since index 0 is reserved for the facility).
    pub fn index_of(&self, emp_code: &str) -> Option<usize> {
        self.points.iter().position(|p| match p {
            PointRef::Employee { emp_code: c } => c == emp_code,
            PointRef::Facility => false,
        })
    }
}
