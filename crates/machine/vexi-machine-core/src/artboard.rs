//! The artboard collaborator: named components carrying posed property
//! values, a draw order for occlusion, and nested machine hosts.
//!
//! The engine does not render. An artboard here is the mutable property
//! store a pose gets flushed into, plus the hit geometry listeners test
//! against and the recursion point for nested machines.

use hashbrown::HashMap;

use vexi_api_core::{TypedPath, Value};

use crate::hit::{HitShape, PlacedShape, Vec2};
use crate::ids::ComponentId;
use crate::instance::StateMachineInstance;
use crate::pose::PoseBuffer;

/// One addressable scene element.
#[derive(Debug)]
pub struct Component {
    pub id: ComponentId,
    pub name: String,
    properties: HashMap<String, Value>,
    /// Geometry used by listener hit testing; components without a shape
    /// are not hittable.
    pub hit_shape: Option<HitShape>,
    /// Opaque components occlude everything drawn below them.
    pub opaque: bool,
}

impl Component {
    pub fn property(&self, field: &str) -> Option<&Value> {
        self.properties.get(field)
    }

    pub fn set_property(&mut self, field: impl Into<String>, value: Value) {
        self.properties.insert(field.into(), value);
    }

    fn float_property(&self, field: &str) -> f32 {
        self.properties
            .get(field)
            .and_then(Value::as_float)
            .unwrap_or(0.0)
    }

    /// Hit shape at the component's current x/y offset.
    pub fn placed_shape(&self) -> Option<PlacedShape> {
        self.hit_shape.map(|shape| PlacedShape {
            shape,
            offset: Vec2::new(self.float_property("x"), self.float_property("y")),
        })
    }
}

/// A nested machine hosted by this artboard.
#[derive(Debug)]
pub struct NestedMachine {
    pub name: String,
    pub instance: Box<StateMachineInstance>,
    /// Collapsed hosts skip time advancement but keep input state.
    pub collapsed: bool,
    /// Multiplier applied to the parent's delta time.
    pub time_scale: f32,
}

#[derive(Debug, Default)]
pub struct ArtboardInstance {
    components: Vec<Component>,
    /// Component indexes bottom to top.
    draw_order: Vec<usize>,
    nested: Vec<NestedMachine>,
}

impl ArtboardInstance {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a component on top of the current draw order.
    pub fn add_component(
        &mut self,
        id: ComponentId,
        name: impl Into<String>,
        hit_shape: Option<HitShape>,
        opaque: bool,
    ) -> ComponentId {
        self.components.push(Component {
            id,
            name: name.into(),
            properties: HashMap::new(),
            hit_shape,
            opaque,
        });
        self.draw_order.push(self.components.len() - 1);
        id
    }

    pub fn add_nested(&mut self, nested: NestedMachine) {
        self.nested.push(nested);
    }

    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.iter().find(|c| c.id == id)
    }

    pub fn component_mut(&mut self, id: ComponentId) -> Option<&mut Component> {
        self.components.iter_mut().find(|c| c.id == id)
    }

    pub fn find(&self, name: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.name == name)
    }

    /// Resolve a typed path's target component.
    pub fn resolve(&self, path: &TypedPath) -> Option<ComponentId> {
        self.find(&path.target).map(|c| c.id)
    }

    /// Current value behind a typed path, if the component and field exist.
    pub fn property(&self, path: &TypedPath) -> Option<&Value> {
        self.find(&path.target)?.property(&path.field)
    }

    /// Flush a pose into component properties. Paths naming unknown
    /// components are dropped; a machine keeps running when its artboard
    /// lost a node.
    pub fn apply(&mut self, pose: &PoseBuffer) {
        for (path, value) in pose.iter() {
            if let Some(c) = self.components.iter_mut().find(|c| c.name == path.target) {
                c.properties.insert(path.field.clone(), value.clone());
            }
        }
    }

    /// Components from top-most to bottom-most.
    pub fn draw_order_top_down(&self) -> impl Iterator<Item = &Component> {
        self.draw_order
            .iter()
            .rev()
            .filter_map(move |&i| self.components.get(i))
    }

    /// Advance hosted machines by `dt`, scaled per host. Collapsed hosts
    /// are skipped entirely: no time passes and no triggers are consumed.
    pub fn advance(&mut self, dt: f32) -> bool {
        let mut keeps_going = false;
        for n in &mut self.nested {
            if n.collapsed {
                continue;
            }
            keeps_going |= n.instance.advance(dt * n.time_scale);
        }
        keeps_going
    }

    pub fn nested(&self) -> &[NestedMachine] {
        &self.nested
    }

    pub fn nested_mut(&mut self) -> &mut [NestedMachine] {
        &mut self.nested
    }

    pub fn find_nested_mut(&mut self, name: &str) -> Option<&mut NestedMachine> {
        self.nested.iter_mut().find(|n| n.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_drops_paths_for_missing_components() {
        let mut ab = ArtboardInstance::new();
        ab.add_component(ComponentId(0), "rect", None, false);
        let mut pose = PoseBuffer::new();
        pose.set(TypedPath::new("rect", "x"), Value::f(5.0));
        pose.set(TypedPath::new("ghost", "x"), Value::f(9.0));
        ab.apply(&pose);
        assert_eq!(
            ab.property(&TypedPath::new("rect", "x")),
            Some(&Value::f(5.0))
        );
        assert_eq!(ab.property(&TypedPath::new("ghost", "x")), None);
    }

    #[test]
    fn placed_shape_follows_posed_offset() {
        let mut ab = ArtboardInstance::new();
        ab.add_component(
            ComponentId(0),
            "rect",
            Some(HitShape::Rect {
                x: 0.0,
                y: 0.0,
                w: 10.0,
                h: 10.0,
            }),
            true,
        );
        let mut pose = PoseBuffer::new();
        pose.set(TypedPath::new("rect", "x"), Value::f(100.0));
        ab.apply(&pose);
        let shape = ab.find("rect").unwrap().placed_shape().unwrap();
        assert_eq!(shape.offset, Vec2::new(100.0, 0.0));
    }
}
