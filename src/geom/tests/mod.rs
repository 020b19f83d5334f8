mod test_mesh_sanity;
mod test_proximity_basic;
