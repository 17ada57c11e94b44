use avl_arena::AvlTree;

fn main() {
    let mut tree: AvlTree<u32, &str> = AvlTree::new();

    for (key, name) in [
        (2, "two"),
        (0, "zero"),
        (3, "three"),
        (4, "four"),
        (5, "five"),
        (1, "one"),
        (6, "six"),
    ] {
        tree.insert(key, name);
        tree.assert_invariants();
        println!("{:?}", tree.iter().map(|(&k, _)| k).collect::<Vec<_>>());
    }

    let mut rendering = String::new();
    tree.dump(&mut rendering).unwrap();
    print!("{rendering}");

    let (zero, name) = tree.pop_first().unwrap();
    assert_eq!((zero, name), (0, "zero"));
    tree.assert_invariants();

    for (key, name) in &tree {
        println!("{key}: {name}");
    }

    drop(tree);
}
