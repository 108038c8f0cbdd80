mod descriptor;
mod guard;
mod model;
