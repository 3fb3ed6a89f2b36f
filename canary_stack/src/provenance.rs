use core::fmt;

use crate::hash::Hasher;

/// Where a stack was created. Used for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Provenance {
    /// Name of the variable or call site that owns the stack
    pub name: &'static str,
    pub file: &'static str,
    /// Enclosing function or module path
    pub function: &'static str,
    pub line: u32,
}

impl Provenance {
    /// Written over the provenance of a destroyed stack.
    pub const TOMBSTONE: Self = Self {
        name: "<destroyed>",
        file: "<destroyed>",
        function: "<destroyed>",
        line: 0,
    };

    #[must_use]
    pub const fn new(
        name: &'static str,
        file: &'static str,
        function: &'static str,
        line: u32,
    ) -> Self {
        Self {
            name,
            file,
            function,
            line,
        }
    }

    #[must_use]
    pub fn is_tombstone(&self) -> bool {
        *self == Self::TOMBSTONE
    }

    pub(crate) fn hash_into(&self, hasher: &mut Hasher) {
        hasher
            .update(self.name.as_bytes())
            .update(self.file.as_bytes())
            .update(self.function.as_bytes())
            .update(&self.line.to_le_bytes());
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "`{}` at {}:{} in {}",
            self.name, self.file, self.line, self.function
        )
    }
}

/// Captures the call site as a [`Provenance`].
///
/// ```
/// use canary_stack::provenance;
///
/// let here = provenance!(numbers);
/// assert_eq!(here.name, "numbers");
/// assert_eq!(here.file, file!());
/// ```
#[macro_export]
macro_rules! provenance {
    ($name:ident) => {
        $crate::Provenance::new(stringify!($name), file!(), module_path!(), line!())
    };
    ($name:literal) => {
        $crate::Provenance::new($name, file!(), module_path!(), line!())
    };
}
