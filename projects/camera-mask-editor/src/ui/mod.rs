// HighGUI front ends: the mask editor and the coordinate picker

pub mod editor;
pub mod picker;
