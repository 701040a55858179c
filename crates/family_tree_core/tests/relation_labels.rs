use family_tree_core::{resolve_relation_labels, RelationLabel as L, Relationship as R};

#[test]
fn two_pets_are_pet_friends() {
    assert_eq!(
        resolve_relation_labels(R::Pet, R::Pet, false),
        (L::PetFriend, L::PetFriend)
    );
    assert_eq!(
        resolve_relation_labels(R::Pet, R::Pet, true),
        (L::PetFriend, L::PetFriend)
    );
}

#[test]
fn single_pet_side_gets_owner_on_the_other() {
    assert_eq!(resolve_relation_labels(R::Pet, R::Child, false), (L::Pet, L::Owner));
    assert_eq!(resolve_relation_labels(R::Spouse, R::Pet, true), (L::Owner, L::Pet));
}

#[test]
fn owner_table_is_keyed_by_first_role() {
    let cases = [
        (R::Child, (L::Parent, L::Child)),
        (R::Parent, (L::Child, L::Parent)),
        (R::Grandparent, (L::Grandchild, L::Grandparent)),
        (R::Spouse, (L::Spouse, L::Spouse)),
        (R::Cousin, (L::Cousin, L::Cousin)),
        (R::Relatives, (L::Relatives, L::Relatives)),
    ];
    for (role, expected) in cases {
        assert_eq!(
            resolve_relation_labels(role, R::Parent, true),
            expected,
            "owner pair starting with {role}"
        );
    }
    assert_eq!(
        resolve_relation_labels(R::Sibling, R::SelfProfile, true),
        (L::Sibling, L::SelfProfile)
    );
}

#[test]
fn owner_table_example_child_parent() {
    assert_eq!(
        resolve_relation_labels(R::Child, R::Parent, true),
        (L::Parent, L::Child)
    );
}

#[test]
fn same_role_pairs_use_same_role_table() {
    assert_eq!(resolve_relation_labels(R::Parent, R::Parent, false), (L::Spouse, L::Spouse));
    assert_eq!(
        resolve_relation_labels(R::Grandparent, R::Grandparent, false),
        (L::Spouse, L::Spouse)
    );
    assert_eq!(resolve_relation_labels(R::Child, R::Child, false), (L::Sibling, L::Sibling));
    assert_eq!(resolve_relation_labels(R::Cousin, R::Cousin, false), (L::Cousin, L::Cousin));
    assert_eq!(
        resolve_relation_labels(R::Relatives, R::Relatives, false),
        (L::Relatives, L::Relatives)
    );
    assert_eq!(resolve_relation_labels(R::Spouse, R::Spouse, false), (L::Spouse, L::Spouse));
}

#[test]
fn cross_role_table_covers_family_combinations() {
    let cases = [
        ((R::Grandparent, R::Parent), (L::Parent, L::Child)),
        ((R::Grandparent, R::Child), (L::GreatGrandparent, L::GreatGrandchild)),
        ((R::Grandparent, R::Cousin), (L::Relatives, L::Relatives)),
        ((R::Grandparent, R::Spouse), (L::Spouse, L::Spouse)),
        ((R::Parent, R::Grandparent), (L::Child, L::Parent)),
        ((R::Parent, R::Child), (L::Parent, L::Child)),
        ((R::Parent, R::Cousin), (L::Cousin, L::Cousin)),
        ((R::Parent, R::Spouse), (L::Parent, L::Child)),
        ((R::Child, R::Parent), (L::Grandparent, L::Grandchild)),
        ((R::Child, R::Grandparent), (L::GreatGrandparent, L::GreatGrandchild)),
        ((R::Child, R::Spouse), (L::Parent, L::Child)),
        ((R::Child, R::Relatives), (L::Relatives, L::Relatives)),
        ((R::Spouse, R::Child), (L::Parent, L::Child)),
        ((R::Spouse, R::Parent), (L::Child, L::Parent)),
        ((R::Spouse, R::Grandparent), (L::Grandchild, L::Grandparent)),
        ((R::Spouse, R::Cousin), (L::Cousin, L::Cousin)),
        ((R::Spouse, R::Sibling), (L::Spouse, L::Spouse)),
        ((R::Cousin, R::Sibling), (L::Relatives, L::Relatives)),
        ((R::Relatives, R::Parent), (L::Relatives, L::Relatives)),
    ];
    for ((role1, role2), expected) in cases {
        assert_eq!(
            resolve_relation_labels(role1, role2, false),
            expected,
            "pair {role1}/{role2}"
        );
    }
}

#[test]
fn untabulated_pairs_pass_through() {
    assert_eq!(
        resolve_relation_labels(R::Sibling, R::Parent, false),
        (L::Sibling, L::Parent)
    );
    assert_eq!(
        resolve_relation_labels(R::Grandparent, R::Sibling, false),
        (L::Grandparent, L::Sibling)
    );
}
