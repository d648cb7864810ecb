/// Marker trait for values that can ride on a [`crate::topic::Topic`].
///
/// Blanket-implemented for every `T: Clone + Default + 'static`; user code
/// never implements this by hand. The bound captures "a value type with an
/// empty/default state" literally: `Default` gives the topic's initial
/// `current` value, `Clone` lets the engine hand out owned copies to
/// multiple subscribers without fighting the borrow checker, and `'static`
/// lets the registry store it behind `dyn Any`.
pub trait TopicState: Clone + Default + 'static {}

impl<T: Clone + Default + 'static> TopicState for T {}
