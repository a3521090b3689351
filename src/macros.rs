/// Lets a type that embeds a [`Node`] be used wherever a node is expected.
///
/// Armatures and sprites keep their scene state in a `Node` field. The macro
/// forwards `AsRef`, `AsMut`, `Deref` and `DerefMut` to that field, so
/// `armature.set_position(..)` reaches the node directly. The field is named
/// `node` unless given as `Type::field`.
///
/// ```rust
/// #[macro_use]
/// extern crate armature;
///
/// struct Banner {
///     base: armature::Node,
/// }
/// node_wrapper!(Banner::base);
///
/// struct Flag {
///     node: armature::Node,
/// }
/// node_wrapper!(Flag);
///
/// # fn main() {
/// let mut flag = Flag { node: armature::Node::new() };
/// flag.set_position([4.0, 2.0]);
/// assert_eq!(flag.position().x, 4.0);
/// # let _ = Banner { base: armature::Node::new() };
/// # }
/// ```
///
/// [`Node`]: node/struct.Node.html
#[macro_export]
macro_rules! node_wrapper {
    ($($name:ident),*) => {
        node_wrapper!($($name::node),*);
    };
    ($($name:ident::$field:ident),*) => {
        $(
            impl AsRef<$crate::Node> for $name {
                fn as_ref(&self) -> &$crate::Node {
                    &self.$field
                }
            }

            impl AsMut<$crate::Node> for $name {
                fn as_mut(&mut self) -> &mut $crate::Node {
                    &mut self.$field
                }
            }

            impl ::std::ops::Deref for $name {
                type Target = $crate::Node;
                fn deref(&self) -> &$crate::Node {
                    &self.$field
                }
            }

            impl ::std::ops::DerefMut for $name {
                fn deref_mut(&mut self) -> &mut $crate::Node {
                    &mut self.$field
                }
            }
        )*
    };
}
