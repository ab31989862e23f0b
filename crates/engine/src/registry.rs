use alchemy_protocol::Element;
use std::collections::HashSet;

/// Known elements in the order the player unlocked them.
///
/// The base set counts as discovered from the start. The set only grows.
#[derive(Debug, Clone, Default)]
pub struct ElementRegistry {
    discovered: Vec<Element>,
    ids: HashSet<String>,
}

impl ElementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base(base: impl IntoIterator<Item = Element>) -> Self {
        let mut reg = Self::new();
        for el in base {
            reg.discover(el);
        }
        reg
    }

    /// Returns `true` when the element was not known before.
    pub fn discover(&mut self, element: Element) -> bool {
        if !self.ids.insert(element.id.clone()) {
            return false;
        }
        self.discovered.push(element);
        true
    }

    pub fn get(&self, id: &str) -> Option<&Element> {
        if !self.ids.contains(id) {
            return None;
        }
        self.discovered.iter().find(|el| el.id == id)
    }

    pub fn panel(&self) -> &[Element] {
        &self.discovered
    }

    pub fn len(&self) -> usize {
        self.discovered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.discovered.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rediscovery_is_idempotent() {
        let mut reg = ElementRegistry::with_base([
            Element::new("water", "water", "💧"),
            Element::new("fire", "fire", "🔥"),
        ]);
        assert!(reg.discover(Element::new("steam1", "steam", "💨")));
        assert!(!reg.discover(Element::new("steam1", "steam", "💨")));
        assert!(!reg.discover(Element::new("water", "water", "💧")));

        let names: Vec<_> = reg.panel().iter().map(|el| el.name.as_str()).collect();
        assert_eq!(names, ["water", "fire", "steam"]);
    }

    #[test]
    fn lookup_by_id() {
        let reg = ElementRegistry::with_base([Element::new("fire", "fire", "🔥")]);
        assert_eq!(reg.get("fire").map(|el| el.emoji.as_str()), Some("🔥"));
        assert!(reg.get("water").is_none());
    }
}
