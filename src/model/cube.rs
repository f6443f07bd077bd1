//! Cube and field reference types

use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// A named cube in the remote data schema.
///
/// Cloning is cheap: the name is shared between the cube and every reference
/// it hands out.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cube {
    name: Arc<str>,
}

impl Cube {
    /// Create a cube handle for the given schema name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Arc::from(name.into()),
        }
    }

    /// Cube name as configured on the service
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reference a measure (aggregatable metric) of this cube
    pub fn measure(&self, name: impl Into<String>) -> Measure {
        Measure::new(self.clone(), name)
    }

    /// Reference a dimension (groupable attribute) of this cube
    pub fn dimension(&self, name: impl Into<String>) -> Dimension {
        Dimension::new(self.clone(), name)
    }

    /// Reference a segment (predefined named filter) of this cube
    pub fn segment(&self, name: impl Into<String>) -> Segment {
        Segment::new(self.clone(), name)
    }
}

impl fmt::Display for Cube {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

macro_rules! field_reference {
    ($(#[$meta:meta])* $ty:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $ty {
            cube: Cube,
            name: String,
        }

        impl $ty {
            fn new(cube: Cube, name: impl Into<String>) -> Self {
                Self {
                    cube,
                    name: name.into(),
                }
            }

            /// Owning cube
            pub fn cube(&self) -> &Cube {
                &self.cube
            }

            /// Field name within the cube
            pub fn name(&self) -> &str {
                &self.name
            }

            /// Wire form: `<cube>.<field>`
            pub fn path(&self) -> String {
                format!("{}.{}", self.cube.name(), self.name)
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}.{}", self.cube.name(), self.name)
            }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }
    };
}

field_reference!(
    /// Reference to a measure
    Measure
);
field_reference!(
    /// Reference to a dimension
    Dimension
);
field_reference!(
    /// Reference to a segment
    Segment
);

/// A cube member that can be filtered or ordered on.
///
/// Filtering on a dimension restricts raw rows before aggregation; filtering
/// on a measure restricts results after the measure is calculated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Member {
    Dimension(Dimension),
    Measure(Measure),
}

impl Member {
    /// Wire form: `<cube>.<field>`
    pub fn path(&self) -> String {
        match self {
            Self::Dimension(d) => d.path(),
            Self::Measure(m) => m.path(),
        }
    }
}

impl From<Dimension> for Member {
    fn from(dimension: Dimension) -> Self {
        Self::Dimension(dimension)
    }
}

impl From<Measure> for Member {
    fn from(measure: Measure) -> Self {
        Self::Measure(measure)
    }
}

impl From<&Dimension> for Member {
    fn from(dimension: &Dimension) -> Self {
        Self::Dimension(dimension.clone())
    }
}

impl From<&Measure> for Member {
    fn from(measure: &Measure) -> Self {
        Self::Measure(measure.clone())
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dimension(d) => fmt::Display::fmt(d, f),
            Self::Measure(m) => fmt::Display::fmt(m, f),
        }
    }
}

impl Serialize for Member {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
