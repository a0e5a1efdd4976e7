/*
 * This module defines the graph format the topology view works on:
 * devices and links as the backend reports them, and the store that holds them as a graph.
 */

pub mod device;
pub mod link;
pub mod network_graph;
pub mod node;
