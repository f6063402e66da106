//! Dense satellite × user connection matrix
//!
//! Each cell is either unassigned (`None`) or the channel of a candidate
//! beam. One matrix is created per solve call and mutated in place by each
//! stage.

use crate::Channel;

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionMatrix {
    n_sats: usize,
    n_users: usize,
    cells: Vec<Option<Channel>>,
}

impl ConnectionMatrix {
    pub fn new(n_sats: usize, n_users: usize) -> Self {
        Self {
            n_sats,
            n_users,
            cells: vec![None; n_sats * n_users],
        }
    }

    pub fn n_sats(&self) -> usize {
        self.n_sats
    }

    pub fn n_users(&self) -> usize {
        self.n_users
    }

    pub fn get(&self, sat: usize, user: usize) -> Option<Channel> {
        self.cells[self.offset(sat, user)]
    }

    pub fn set(&mut self, sat: usize, user: usize, channel: Channel) {
        let i = self.offset(sat, user);
        self.cells[i] = Some(channel);
    }

    pub fn clear(&mut self, sat: usize, user: usize) {
        let i = self.offset(sat, user);
        self.cells[i] = None;
    }

    /// One satellite's cells, in user index order
    pub fn row(&self, sat: usize) -> &[Option<Channel>] {
        let start = sat * self.n_users;
        &self.cells[start..start + self.n_users]
    }

    pub fn row_mut(&mut self, sat: usize) -> &mut [Option<Channel>] {
        let start = sat * self.n_users;
        &mut self.cells[start..start + self.n_users]
    }

    /// Satellites with a viable cell for `user`, following `sat_order`
    pub fn sats_for_user(&self, user: usize, sat_order: &[usize]) -> Vec<usize> {
        sat_order
            .iter()
            .copied()
            .filter(|&sat| self.get(sat, user).is_some())
            .collect()
    }

    /// Users with a viable cell on `sat`, following `user_order`
    pub fn users_on_sat(&self, sat: usize, user_order: &[usize]) -> Vec<usize> {
        user_order
            .iter()
            .copied()
            .filter(|&user| self.get(sat, user).is_some())
            .collect()
    }

    /// Viable cells on one satellite
    pub fn sat_load(&self, sat: usize) -> usize {
        self.row(sat).iter().filter(|c| c.is_some()).count()
    }

    /// Viable cells across the whole matrix
    pub fn viable_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Viable `(sat, user, channel)` cells in satellite-major index order
    pub fn viable_cells(&self) -> impl Iterator<Item = (usize, usize, Channel)> + '_ {
        let n_users = self.n_users;
        self.cells
            .iter()
            .enumerate()
            .filter_map(move |(i, c)| c.map(|channel| (i / n_users, i % n_users, channel)))
    }

    fn offset(&self, sat: usize, user: usize) -> usize {
        debug_assert!(sat < self.n_sats && user < self.n_users);
        sat * self.n_users + user
    }
}
