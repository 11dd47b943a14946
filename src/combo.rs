use crate::consts::MAX_MODIFIERS;
use crate::names::modifier_alias;
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Combo {
    pub primary: String,
    pub modifiers: Vec<String>,
}

impl Combo {
    pub(crate) fn new(primary: impl Into<String>, mut modifiers: Vec<String>) -> Self {
        modifiers.sort();
        Self {
            primary: primary.into(),
            modifiers,
        }
    }
}

/// Primary first, then modifier count, then modifiers one by one.
impl Ord for Combo {
    fn cmp(&self, other: &Self) -> Ordering {
        self.primary
            .cmp(&other.primary)
            .then(self.modifiers.len().cmp(&other.modifiers.len()))
            .then_with(|| self.modifiers.cmp(&other.modifiers))
    }
}

impl PartialOrd for Combo {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Combo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in &self.modifiers {
            write!(f, "{}+", modifier)?;
        }
        f.write_str(&self.primary)
    }
}

/// The combo currently being held down.
///
/// The most recently pressed key is the primary; pressing another key demotes
/// it to a modifier (under its alias). Single keys complete on press, combos
/// with modifiers complete on the first release.
#[derive(Debug, Default)]
pub(crate) struct ActiveCombo {
    primary: Option<String>,
    modifiers: Vec<String>,
}

impl ActiveCombo {
    pub(crate) fn press(&mut self, name: &str) -> Option<Combo> {
        // Autorepeat of the held key.
        if self.primary.as_deref() == Some(name) {
            return None;
        }

        if let Some(previous) = self.primary.take() {
            let alias = modifier_alias(&previous);
            if self.modifiers.len() < MAX_MODIFIERS
                && !self.modifiers.iter().any(|m| m.as_str() == alias)
            {
                self.modifiers.push(alias.to_owned());
            }
        }

        self.modifiers.retain(|m| m.as_str() != name);
        self.primary = Some(name.to_owned());

        if self.modifiers.is_empty() {
            Some(Combo::new(name, Vec::new()))
        } else {
            None
        }
    }

    /// Returns the combo as it stood before this release, if it had modifiers.
    pub(crate) fn release(&mut self, name: &str) -> Option<Combo> {
        let completed = match &self.primary {
            Some(primary) if !self.modifiers.is_empty() => {
                self.modifiers.sort();
                Some(Combo {
                    primary: primary.clone(),
                    modifiers: self.modifiers.clone(),
                })
            }
            _ => None,
        };

        if self.primary.as_deref() == Some(name) {
            self.primary = None;
        }

        let alias = modifier_alias(name);
        self.modifiers.retain(|m| m.as_str() != alias);

        completed
    }

    #[cfg(test)]
    pub(crate) fn primary(&self) -> Option<&str> {
        self.primary.as_deref()
    }

    #[cfg(test)]
    pub(crate) fn modifiers(&self) -> &[String] {
        &self.modifiers
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.primary.is_none() && self.modifiers.is_empty()
    }
}
