use termtree::Tree;

use crate::domain::tree::{ChildRef, ParentTree};

/// Renders a tree with `termtree`, listing at most `limit` children.
pub fn render(tree: &ParentTree, limit: usize) -> Tree<String> {
    let root = format!(
        "{} (num1={}, num2={}, sum={})",
        tree.name(),
        tree.num1(),
        tree.num2(),
        tree.sum()
    );
    let mut out = Tree::new(root);

    for child in tree.children().take(limit) {
        out.push(render_child(&child));
    }

    let hidden = tree.child_count().saturating_sub(limit);
    if hidden > 0 {
        out.push(Tree::new(format!("... {hidden} more")));
    }
    out
}

fn render_child(child: &ChildRef<'_>) -> Tree<String> {
    let label = format!(
        "{} num={:.2} sum={:.2}",
        child.kind(),
        child.num(),
        child.collect_sum()
    );
    let leaves: Vec<Tree<String>> = child
        .children()
        .map(|g| Tree::new(format!("{} num={:.2}", g.combo(), g.num())))
        .collect();
    Tree::new(label).with_leaves(leaves)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::builder::TreeBuilder;
    use crate::domain::random::FixedSequence;
    use crate::domain::snapshot::ParentSnapshot;

    #[test]
    fn given_tree_when_rendering_with_limit_then_truncates_children() {
        let mut rng = FixedSequence::new(vec![0.0]);
        let snapshot = ParentSnapshot::uniform("Foo", "Bar", 1.0, 2.0, 3, 2);
        let tree = TreeBuilder::default().build(&snapshot, &mut rng);

        let rendered = render(&tree, 2).to_string();

        assert!(rendered.starts_with("Foo Bar (num1=1, num2=2, sum=3)"));
        assert_eq!(rendered.matches("Foo Bar -> A -> X").count(), 4);
        assert!(rendered.contains("... 1 more"));
    }
}
