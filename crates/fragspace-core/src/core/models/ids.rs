use slotmap::new_key_type;

new_key_type! {
    pub struct SynthonId;
}

/// Tag of a reactive bond-forming site shared by the synthons it joins.
pub type LinkerId = u32;

/// Index of the reactant slot of a reaction that a synthon fills.
pub type Position = usize;
